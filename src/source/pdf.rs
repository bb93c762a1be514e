//! PDF span source backed by lopdf.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{BBox, DocumentMetadata, TextSpan};
use crate::options::DEFAULT_PAGE_SIZE;

use super::detect::{detect_bytes, detect_path};
use super::SpanSource;

/// Glyph ascent above the baseline, as a fraction of font size.
const ASCENT: f32 = 0.8;
/// Glyph descent below the baseline, as a fraction of font size.
const DESCENT: f32 = 0.2;
/// Advance width per character, as a fraction of font size, for fonts
/// without glyph metrics.
const CHAR_WIDTH: f32 = 0.5;
/// Gap between spans, as a fraction of average glyph width, treated as a
/// word break.
const WORD_GAP: f32 = 0.2;
/// Baseline distance, as a fraction of font size, within which two spans
/// share a line for word break detection.
const SAME_LINE_FRACTION: f32 = 0.5;
/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Parent dictionaries followed when looking up inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// A PDF document opened with lopdf.
pub struct LopdfSource {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfSource {
    /// Open a PDF file after checking its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_path(path)?;
        let doc = Document::load(path)?;
        Ok(Self::from_document(doc))
    }

    /// Load a PDF from memory after checking its header.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect_bytes(data)?;
        let doc = Document::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; text may be unreadable");
        }
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    /// PDF version string (e.g. "1.7").
    pub fn version(&self) -> &str {
        &self.doc.version
    }

    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Document information dictionary plus page count and version.
    pub fn metadata(&self) -> DocumentMetadata {
        let mut metadata = DocumentMetadata {
            pdf_version: self.doc.version.clone(),
            page_count: self.page_count(),
            encrypted: self.doc.is_encrypted(),
            ..Default::default()
        };

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| self.resolve_dict(obj));

        if let Some(info) = info {
            metadata.title = get_string_from_dict(info, b"Title");
            metadata.author = get_string_from_dict(info, b"Author");
            metadata.subject = get_string_from_dict(info, b"Subject");
            metadata.keywords = get_string_from_dict(info, b"Keywords");
            metadata.creator = get_string_from_dict(info, b"Creator");
            metadata.producer = get_string_from_dict(info, b"Producer");
            metadata.created =
                get_string_from_dict(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified =
                get_string_from_dict(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(obj).as_dict().ok()
    }

    fn font_info(&self, key: &[u8], font: &Dictionary) -> FontInfo {
        let name = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| self.resolve(o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());

        FontInfo {
            name,
            widths: self.glyph_widths(font),
        }
    }

    /// `FirstChar`/`Widths` metrics of a simple font. Composite (Type0)
    /// fonts use multi-byte codes and are measured with the estimate.
    fn glyph_widths(&self, font: &Dictionary) -> Option<GlyphWidths> {
        let is_composite = font
            .get(b"Subtype")
            .and_then(|o| o.as_name())
            .is_ok_and(|n| n == b"Type0");
        if is_composite {
            return None;
        }

        let first_char = self.resolve(font.get(b"FirstChar").ok()?).as_i64().ok()?;
        let widths: Vec<f32> = self
            .resolve(font.get(b"Widths").ok()?)
            .as_array()
            .ok()?
            .iter()
            .map(|w| get_number(self.resolve(w)).unwrap_or(0.0))
            .collect();
        let missing = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| self.resolve_dict(d))
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|w| get_number(self.resolve(w)))
            .filter(|w| *w > 0.0)
            .unwrap_or(CHAR_WIDTH * 1000.0);

        Some(GlyphWidths {
            first_char: u32::try_from(first_char).ok()?,
            widths,
            missing,
        })
    }

    /// Look up a page attribute, following `Parent` links for inherited
    /// values such as `MediaBox`.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }
}

impl SpanSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<(f32, f32)> {
        let page_id = self.page_id(page).ok()?;
        let media_box = self.inherited_attribute(page_id, b"MediaBox")?.as_array().ok()?;
        if media_box.len() < 4 {
            return None;
        }

        let coord = |i: usize| self.resolve(&media_box[i]).as_float().ok();
        let (x0, y0, x1, y1) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);
        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());

        (width > 0.0 && height > 0.0).then_some((width, height))
    }

    fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(page)?;

        let page_fonts = self.doc.get_page_fonts(page_id)?;
        let fonts: HashMap<Vec<u8>, FontInfo> = page_fonts
            .iter()
            .map(|(key, font)| (key.clone(), self.font_info(key, font)))
            .collect();

        let decode = |font_key: &[u8], bytes: &[u8]| -> String {
            page_fonts
                .get(font_key)
                .and_then(|font| font.get_font_encoding(&self.doc).ok())
                .and_then(|encoding| Document::decode_text(&encoding, bytes).ok())
                .unwrap_or_else(|| decode_text_simple(bytes))
        };

        let data = self.doc.get_page_content(page_id)?;
        let content = Content::decode(&data)
            .map_err(|e| Error::PdfParse(format!("page {}: {}", page, e)))?;

        let (_, page_height) = self.page_size(page).unwrap_or(DEFAULT_PAGE_SIZE);
        let spans = spans_from_operations(&content.operations, page, page_height, &fonts, &decode);

        log::debug!("Page {}: {} spans", page, spans.len());
        Ok(spans)
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.doc
            .extract_text(&[page])
            .map_err(|e| Error::PdfParse(format!("page {}: {}", page, e)))
    }
}

/// Affine matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl Matrix {
    fn translated(self, tx: f32, ty: f32) -> Self {
        Self {
            e: self.e + tx * self.a + ty * self.c,
            f: self.f + tx * self.b + ty * self.d,
            ..self
        }
    }

    /// `self × other`: apply `self`, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// Advance widths of a simple font's character codes, in thousandths of
/// an em.
#[derive(Debug, Clone, PartialEq)]
struct GlyphWidths {
    first_char: u32,
    widths: Vec<f32>,
    /// Width for codes outside the table
    missing: f32,
}

impl GlyphWidths {
    /// Width of a string operand in ems.
    fn measure(&self, bytes: &[u8]) -> f32 {
        let total: f32 = bytes
            .iter()
            .map(|&code| {
                (code as u32)
                    .checked_sub(self.first_char)
                    .and_then(|i| self.widths.get(i as usize))
                    .copied()
                    .unwrap_or(self.missing)
            })
            .sum();
        total / 1000.0
    }
}

/// A page font resource: base font name and glyph metrics, if declared.
#[derive(Debug, Clone, Default)]
struct FontInfo {
    name: String,
    widths: Option<GlyphWidths>,
}

/// Parameters saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font_key: Vec<u8>,
    font_size: f32,
    leading: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::default(),
            font_key: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

/// Right edge of the last emitted span, in page space.
#[derive(Debug, Clone, Copy)]
struct PenEnd {
    x: f32,
    baseline: f32,
    size: f32,
    last_char: char,
}

/// Text and graphics state tracked while walking a content stream.
#[derive(Debug, Clone, Default)]
struct TextState {
    gs: GraphicsState,
    saved: Vec<GraphicsState>,
    line: Matrix,
    text: Matrix,
    in_text: bool,
    last: Option<PenEnd>,
}

impl TextState {
    fn begin(&mut self) {
        self.line = Matrix::default();
        self.text = Matrix::default();
        self.in_text = true;
    }

    fn save(&mut self) {
        self.saved.push(self.gs.clone());
    }

    fn restore(&mut self) {
        match self.saved.pop() {
            Some(gs) => self.gs = gs,
            None => log::debug!("Unbalanced Q operator"),
        }
    }

    fn concat(&mut self, m: Matrix) {
        self.gs.ctm = m.then(&self.gs.ctm);
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line = self.line.translated(tx, ty);
        self.text = self.line;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.gs.leading);
    }

    fn set_matrix(&mut self, m: Matrix) {
        self.line = m;
        self.text = m;
    }

    /// Move the pen right by `tx` text space units.
    fn advance(&mut self, tx: f32) {
        self.text = self.text.translated(tx, 0.0);
    }

    /// Width of a string operand in ems for the current font.
    fn measure(&self, fonts: &HashMap<Vec<u8>, FontInfo>, bytes: &[u8], text: &str) -> f32 {
        match fonts.get(&self.gs.font_key).and_then(|f| f.widths.as_ref()) {
            Some(widths) => widths.measure(bytes),
            None => text.chars().count() as f32 * CHAR_WIDTH,
        }
    }

    /// Emit a span for `text`, `ems` wide, at the current pen position and
    /// advance past it.
    ///
    /// A space is prepended when the span starts on the same baseline as
    /// the previous one after a visible gap.
    fn show(
        &mut self,
        mut text: String,
        ems: f32,
        page: &PageGeometry<'_>,
        spans: &mut Vec<TextSpan>,
    ) {
        let advance = ems * self.gs.font_size;

        if !text.trim().is_empty() {
            let trm = self.text.then(&self.gs.ctm);
            let size = self.gs.font_size * trm.vertical_scale();
            let width = advance * trm.horizontal_scale();
            let (x, baseline) = (trm.e, trm.f);

            if self.starts_new_word(&text, x, baseline, size, width) {
                text.insert(0, ' ');
            }

            let bbox = BBox::new(
                x,
                page.height - (baseline + ASCENT * size),
                x + width,
                page.height - (baseline - DESCENT * size),
            );
            self.last = text.chars().last().map(|last_char| PenEnd {
                x: x + width,
                baseline,
                size,
                last_char,
            });

            let font_name = page
                .fonts
                .get(&self.gs.font_key)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| String::from_utf8_lossy(&self.gs.font_key).to_string());
            spans.push(TextSpan::new(text, size, font_name, page.number, bbox));
        }

        self.advance(advance);
    }

    fn starts_new_word(&self, text: &str, x: f32, baseline: f32, size: f32, width: f32) -> bool {
        let Some(prev) = self.last else {
            return false;
        };
        let Some(first) = text.chars().next() else {
            return false;
        };

        let same_line = (baseline - prev.baseline).abs() < SAME_LINE_FRACTION * size.max(prev.size);
        let char_width = width / text.chars().count() as f32;
        let already_spaced = prev.last_char.is_whitespace() || first.is_whitespace();
        let both_spaceless =
            is_spaceless_script_char(prev.last_char) && is_spaceless_script_char(first);

        same_line && x - prev.x > WORD_GAP * char_width && !already_spaced && !both_spaceless
    }
}

/// Per-page inputs of the content stream walk.
struct PageGeometry<'a> {
    number: u32,
    height: f32,
    fonts: &'a HashMap<Vec<u8>, FontInfo>,
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = get_number(obj)?;
    }
    Some(out)
}

/// Walk content stream operations and collect positioned text spans.
///
/// `fonts` maps resource keys to font names and metrics. `decode` turns a
/// string operand into text using the font identified by its resource key.
/// Positions follow the text matrix composed with the current
/// transformation matrix; span boxes are in top-down coordinates for a
/// page of `page_height`.
fn spans_from_operations(
    operations: &[Operation],
    page: u32,
    page_height: f32,
    fonts: &HashMap<Vec<u8>, FontInfo>,
    decode: &dyn Fn(&[u8], &[u8]) -> String,
) -> Vec<TextSpan> {
    let geometry = PageGeometry {
        number: page,
        height: page_height,
        fonts,
    };
    let mut spans = Vec::new();
    let mut state = TextState::default();

    for op in operations {
        match op.operator.as_str() {
            "q" => state.save(),
            "Q" => state.restore(),
            "cm" => {
                if let Some([a, b, c, d, e, f]) = numbers::<6>(&op.operands) {
                    state.concat(Matrix { a, b, c, d, e, f });
                }
            }
            "BT" => state.begin(),
            "ET" => state.in_text = false,
            "Tf" => {
                if let [Object::Name(key), size, ..] = op.operands.as_slice() {
                    state.gs.font_key = key.clone();
                    state.gs.font_size = get_number(size).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(&op.operands) {
                    state.gs.leading = leading;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(&op.operands) {
                    state.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(&op.operands) {
                    state.gs.leading = -ty;
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some([a, b, c, d, e, f]) = numbers::<6>(&op.operands) {
                    state.set_matrix(Matrix { a, b, c, d, e, f });
                }
            }
            "T*" => state.next_line(),
            "Tj" if state.in_text => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    show_string(&mut state, bytes, &geometry, decode, &mut spans);
                }
            }
            "TJ" if state.in_text => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    show_array(&mut state, items, &geometry, decode, &mut spans);
                }
            }
            "'" | "\"" => {
                state.next_line();
                let index = if op.operator == "\"" { 2 } else { 0 };
                match op.operands.get(index) {
                    Some(Object::String(bytes, _)) if state.in_text => {
                        show_string(&mut state, bytes, &geometry, decode, &mut spans);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    spans
}

fn show_string(
    state: &mut TextState,
    bytes: &[u8],
    page: &PageGeometry<'_>,
    decode: &dyn Fn(&[u8], &[u8]) -> String,
    spans: &mut Vec<TextSpan>,
) {
    let text = decode(&state.gs.font_key, bytes);
    let ems = state.measure(page.fonts, bytes, &text);
    state.show(text, ems, page, spans);
}

/// Show a TJ array as one span, inserting a space at large negative
/// adjustments.
fn show_array(
    state: &mut TextState,
    items: &[Object],
    page: &PageGeometry<'_>,
    decode: &dyn Fn(&[u8], &[u8]) -> String,
    spans: &mut Vec<TextSpan>,
) {
    let mut combined = String::new();
    let mut ems = 0.0;
    let mut adjustment = 0.0;

    for item in items {
        match item {
            Object::String(bytes, _) => {
                let text = decode(&state.gs.font_key, bytes);
                ems += state.measure(page.fonts, bytes, &text);
                combined.push_str(&text);
            }
            other => {
                let Some(n) = get_number(other) else {
                    continue;
                };
                adjustment += -n / 1000.0 * state.gs.font_size;
                let needs_space = -n > TJ_SPACE_THRESHOLD
                    && combined
                        .chars()
                        .last()
                        .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                if needs_space {
                    combined.push(' ');
                }
            }
        }
    }

    state.show(combined, ems, page, spans);
    state.advance(adjustment);
}

/// Whether a character belongs to a script written without word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK symbols and punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// Decode a string operand when the font has no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(utf16) = decode_utf16_be(bytes) {
        return utf16;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_utf16_be(bytes: &[u8]) -> Option<String> {
    let rest = bytes.strip_prefix(&[0xFE, 0xFF])?;
    let units: Vec<u16> = rest
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS...`). Missing fields default
/// to the start of their range; the timezone suffix is ignored.
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
