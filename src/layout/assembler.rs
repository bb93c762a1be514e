//! Grouping of positioned spans into visual lines.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::{Line, TextSpan};

/// Default vertical tolerance for spans on the same line, in points.
pub const DEFAULT_Y_TOLERANCE: f32 = 2.0;

/// Groups spans into lines with a single greedy pass.
///
/// Input spans must already be sorted by page, vertical position and left
/// edge (see [`sort_spans`]). A new line starts whenever the page changes or
/// the vertical position moves by at least the tolerance relative to the
/// previous span.
#[derive(Debug, Clone, Copy)]
pub struct LineAssembler {
    y_tolerance: f32,
}

impl LineAssembler {
    pub fn new(y_tolerance: f32) -> Self {
        Self { y_tolerance }
    }

    pub fn y_tolerance(&self) -> f32 {
        self.y_tolerance
    }

    /// Group sorted spans into lines, dropping lines whose text normalizes
    /// to nothing.
    pub fn group(&self, spans: &[TextSpan]) -> Vec<Line> {
        let lines: Vec<Line> = self
            .split_groups(spans)
            .into_iter()
            .filter_map(finish_line)
            .collect();

        log::debug!("Assembled {} lines from {} spans", lines.len(), spans.len());
        lines
    }

    fn split_groups<'a>(&self, spans: &'a [TextSpan]) -> Vec<Vec<&'a TextSpan>> {
        let mut groups: Vec<Vec<&TextSpan>> = Vec::new();
        let mut current: Vec<&TextSpan> = Vec::new();

        for span in spans {
            if let Some(prev) = current.last() {
                let same_line = span.page == prev.page
                    && (span.y_position - prev.y_position).abs() < self.y_tolerance;
                if !same_line {
                    groups.push(std::mem::take(&mut current));
                }
            }
            current.push(span);
        }

        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_Y_TOLERANCE)
    }
}

/// Sort spans into the order [`LineAssembler::group`] expects.
pub fn sort_spans(spans: &mut [TextSpan]) {
    spans.sort_by(|a, b| a.reading_order(b));
}

fn finish_line(mut group: Vec<&TextSpan>) -> Option<Line> {
    group.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    let text = normalize_line_text(&join_spans(&group));
    if text.is_empty() {
        return None;
    }

    Line::from_spans(group.iter().copied(), text)
}

/// Concatenate span texts in horizontal order. Word breaks between spans
/// are the span source's concern.
fn join_spans(spans: &[&TextSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

fn toc_pattern() -> &'static Regex {
    static TOC: OnceLock<Regex> = OnceLock::new();
    TOC.get_or_init(|| Regex::new(r"^(.*?)\.{3,}\s*\d+$").expect("valid TOC pattern"))
}

/// Normalize raw line text: NFC, trim, and strip table-of-contents dot
/// leaders with their trailing page number.
pub fn normalize_line_text(raw: &str) -> String {
    let text: String = raw.nfc().collect();
    let text = text.trim();

    if let Some(caps) = toc_pattern().captures(text) {
        return caps[1].trim().to_string();
    }

    if text.ends_with("...") && text.matches('.').count() > 3 {
        return text.trim_end_matches([' ', '.']).to_string();
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn span(text: &str, page: u32, x0: f32, y: f32, width: f32) -> TextSpan {
        TextSpan::new(text, 10.0, "Helvetica", page, BBox::new(x0, y, x0 + width, y + 10.0))
    }

    #[test]
    fn test_distinct_lines_when_delta_exceeds_tolerance() {
        let spans = vec![
            span("Intro", 1, 72.0, 80.0, 25.0),
            span("Details follow.", 1, 72.0, 100.0, 75.0),
        ];
        let lines = LineAssembler::default().group(&spans);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Intro");
        assert_eq!(lines[1].text, "Details follow.");
    }

    #[test]
    fn test_spans_within_tolerance_share_a_line() {
        let spans = vec![
            span("Hello ", 1, 72.0, 100.0, 25.0),
            span("world", 1, 100.0, 101.5, 25.0),
        ];
        let lines = LineAssembler::default().group(&spans);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
        assert_eq!(lines[0].bbox, BBox::new(72.0, 100.0, 125.0, 111.5));
    }

    #[test]
    fn test_delta_equal_to_tolerance_splits() {
        let spans = vec![
            span("one", 1, 72.0, 100.0, 15.0),
            span("two", 1, 72.0, 102.0, 15.0),
        ];
        assert_eq!(LineAssembler::default().group(&spans).len(), 2);
    }

    #[test]
    fn test_page_change_starts_new_line() {
        let spans = vec![
            span("footer", 1, 72.0, 100.0, 30.0),
            span("header", 2, 72.0, 100.0, 30.0),
        ];
        let lines = LineAssembler::default().group(&spans);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].page, 2);
    }

    #[test]
    fn test_tolerance_is_relative_to_previous_span() {
        // Each step is under the tolerance, so the drift chains into one line.
        let spans = vec![
            span("a", 1, 10.0, 100.0, 5.0),
            span("b", 1, 20.0, 101.5, 5.0),
            span("c", 1, 30.0, 103.0, 5.0),
        ];
        assert_eq!(LineAssembler::default().group(&spans).len(), 1);
    }

    #[test]
    fn test_spans_reordered_horizontally() {
        // Same y, extraction order right-to-left.
        let spans = vec![
            span("World", 1, 110.0, 100.0, 25.0),
            span("Hello ", 1, 72.0, 100.0, 25.0),
        ];
        let lines = LineAssembler::default().group(&spans);
        assert_eq!(lines[0].text, "Hello World");
        assert_eq!(lines[0].font_name, "Helvetica");
    }

    #[test]
    fn test_adjacent_spans_not_spaced() {
        let spans = vec![
            span("Head", 1, 72.0, 100.0, 20.0),
            span("ing", 1, 92.0, 100.0, 15.0),
        ];
        let lines = LineAssembler::default().group(&spans);
        assert_eq!(lines[0].text, "Heading");
    }

    #[test]
    fn test_span_text_joined_verbatim() {
        // A wide gap adds nothing; only the spans' own text is kept.
        let spans = vec![
            span("1.", 1, 72.0, 100.0, 10.0),
            span("Intro", 1, 120.0, 100.0, 25.0),
        ];
        let lines = LineAssembler::default().group(&spans);
        assert_eq!(lines[0].text, "1.Intro");
        assert_eq!(lines[0].bbox.x1, 145.0);
    }

    #[test]
    fn test_empty_lines_dropped() {
        let spans = vec![
            span("   ", 1, 72.0, 100.0, 10.0),
            span("Text", 1, 72.0, 120.0, 20.0),
        ];
        let lines = LineAssembler::default().group(&spans);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Text");
    }

    #[test]
    fn test_toc_leaders_stripped() {
        assert_eq!(normalize_line_text("Introduction ........ 3"), "Introduction");
        assert_eq!(normalize_line_text("2.1 Scope.....12"), "2.1 Scope");
    }

    #[test]
    fn test_trailing_ellipsis_fallback() {
        assert_eq!(normalize_line_text("Overview . . . ..."), "Overview");
        assert_eq!(normalize_line_text("Wait..."), "Wait...");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(normalize_line_text("  Version 2.0 "), "Version 2.0");
    }

    #[test]
    fn test_grouping_idempotent_on_own_output() {
        let mut spans = vec![
            span("Title", 1, 200.0, 50.0, 60.0),
            span("First ", 1, 72.0, 100.0, 25.0),
            span("line", 1, 100.0, 100.5, 20.0),
            span("Second line", 1, 72.0, 120.0, 55.0),
            span("Next page", 2, 72.0, 60.0, 45.0),
        ];
        sort_spans(&mut spans);
        let assembler = LineAssembler::default();
        let lines = assembler.group(&spans);

        let mut regrouped: Vec<TextSpan> = lines
            .iter()
            .map(|l| {
                let mut s = TextSpan::new(
                    l.text.clone(),
                    l.avg_font_size,
                    l.font_name.clone(),
                    l.page,
                    l.bbox,
                );
                s.y_position = l.y_position;
                s
            })
            .collect();
        sort_spans(&mut regrouped);
        let again = assembler.group(&regrouped);

        assert_eq!(lines, again);
    }

    #[test]
    fn test_output_in_reading_order() {
        let mut spans = vec![
            span("c", 2, 72.0, 10.0, 5.0),
            span("b", 1, 72.0, 300.0, 5.0),
            span("a", 1, 72.0, 40.0, 5.0),
        ];
        sort_spans(&mut spans);
        let lines = LineAssembler::default().group(&spans);

        assert_eq!(lines.len(), 3);
        for pair in lines.windows(2) {
            assert!(pair[0].precedes(&pair[1]));
        }
    }
}
