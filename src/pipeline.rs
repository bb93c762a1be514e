//! End-to-end processing: spans to outline, outline to sections.

use std::path::Path;
use std::sync::Arc;

use crate::classify::{FontHeuristicClassifier, HeadingClassifier};
use crate::error::{Error, Result};
use crate::layout::{document_stats, sort_spans, FeatureEngineer, LineAssembler};
use crate::model::{FeaturedLine, Line, Outline, Section, TextSpan};
use crate::options::{ErrorMode, ExtractOptions, PageTextMode};
use crate::outline::OutlineBuilder;
use crate::section::{pages_text_from_lines, PagesText, SectionContentExtractor};
use crate::source::{extract_range, extract_spans, LopdfSource, SpanSource};

/// Ties span extraction, line assembly, feature computation and heading
/// classification together.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{ExtractOptions, Pipeline};
///
/// let pipeline = Pipeline::with_heuristics(ExtractOptions::default());
/// let outline = pipeline.outline_from_path("report.pdf")?;
/// for heading in &outline.headings {
///     println!("{} {} (p. {})", heading.level, heading.text, heading.page);
/// }
/// # Ok::<(), pdfoutline::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    builder: OutlineBuilder,
    options: ExtractOptions,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn HeadingClassifier>, options: ExtractOptions) -> Self {
        Self {
            builder: OutlineBuilder::new(classifier),
            options,
        }
    }

    /// Pipeline using the font-size heuristic classifier.
    pub fn with_heuristics(options: ExtractOptions) -> Self {
        Self::new(Arc::new(FontHeuristicClassifier::default()), options)
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn classifier(&self) -> &dyn HeadingClassifier {
        self.builder.classifier()
    }

    /// Build the outline of a PDF file.
    pub fn outline_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Outline> {
        let path = path.as_ref();
        let source = LopdfSource::open(path)?;
        let spans = self.collect_spans(&source, || LopdfSource::open(path))?;
        self.outline_from_spans(spans, source.page_size(1), &document_name(path))
    }

    /// Build the outline of a PDF held in memory.
    pub fn outline_from_bytes(&self, data: &[u8], name: &str) -> Result<Outline> {
        let source = LopdfSource::from_bytes(data)?;
        let spans = self.collect_spans(&source, || LopdfSource::from_bytes(data))?;
        self.outline_from_spans(spans, source.page_size(1), name)
    }

    /// Build the outline of any span source, reading pages on one handle.
    pub fn outline_from_source<S: SpanSource>(&self, source: &S, name: &str) -> Result<Outline> {
        let spans = self.source_spans(source)?;
        self.outline_from_spans(spans, source.page_size(1), name)
    }

    /// Build an outline from already extracted spans.
    ///
    /// `page_size` is the first page's size; the configured default is used
    /// when it is unknown. Fails with [`Error::EmptyDocument`] when no line
    /// survives grouping.
    pub fn outline_from_spans(
        &self,
        spans: Vec<TextSpan>,
        page_size: Option<(f32, f32)>,
        name: &str,
    ) -> Result<Outline> {
        let featured = self.features_from_spans(spans, page_size, name)?;
        let outline = self.builder.build(&featured)?;

        log::debug!(
            "{}: title {:?}, {} headings",
            name,
            outline.title,
            outline.headings.len()
        );
        Ok(outline)
    }

    /// Feature rows for every line of a PDF file, e.g. for training data.
    pub fn features_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<FeaturedLine>> {
        let path = path.as_ref();
        let source = LopdfSource::open(path)?;
        let spans = self.collect_spans(&source, || LopdfSource::open(path))?;
        self.features_from_spans(spans, source.page_size(1), &document_name(path))
    }

    /// Group spans into lines and compute their features.
    pub fn features_from_spans(
        &self,
        spans: Vec<TextSpan>,
        page_size: Option<(f32, f32)>,
        name: &str,
    ) -> Result<Vec<FeaturedLine>> {
        let lines = self.lines_from_spans(spans);
        if lines.is_empty() {
            return Err(Error::EmptyDocument(name.to_string()));
        }

        let (width, height) = page_size.unwrap_or_else(|| {
            log::warn!(
                "{}: page size unknown, using {}x{}",
                name,
                self.options.default_page_size.0,
                self.options.default_page_size.1
            );
            self.options.default_page_size
        });

        let stats = document_stats(&lines);
        log::debug!("{}: modal font size {}", name, stats.modal_font_size);

        Ok(FeatureEngineer::new(width, height).compute(lines, &stats))
    }

    /// Sort spans into reading order and group them into lines.
    pub fn lines_from_spans(&self, mut spans: Vec<TextSpan>) -> Vec<Line> {
        sort_spans(&mut spans);
        LineAssembler::new(self.options.y_tolerance).group(&spans)
    }

    /// Extract the content of every outline heading from a PDF file.
    pub fn sections_from_path<P: AsRef<Path>>(&self, path: P, outline: &Outline) -> Result<Vec<Section>> {
        let path = path.as_ref();
        let source = LopdfSource::open(path)?;
        let pages = match self.options.text_mode {
            PageTextMode::Lines => {
                let spans = self.collect_spans(&source, || LopdfSource::open(path))?;
                pages_text_from_lines(&self.lines_from_spans(spans), source.page_count())
            }
            PageTextMode::Raw => self.raw_pages_text(&source)?,
        };
        Ok(self.sections_from_pages(outline, &pages, &document_name(path)))
    }

    /// Extract the content of every outline heading from a span source.
    pub fn sections_from_source<S: SpanSource>(
        &self,
        source: &S,
        outline: &Outline,
        name: &str,
    ) -> Result<Vec<Section>> {
        let pages = self.pages_text(source)?;
        Ok(self.sections_from_pages(outline, &pages, name))
    }

    /// Per-page text of a source, following the configured text mode.
    pub fn pages_text<S: SpanSource>(&self, source: &S) -> Result<PagesText> {
        match self.options.text_mode {
            PageTextMode::Lines => {
                let spans = self.source_spans(source)?;
                Ok(pages_text_from_lines(
                    &self.lines_from_spans(spans),
                    source.page_count(),
                ))
            }
            PageTextMode::Raw => self.raw_pages_text(source),
        }
    }

    fn sections_from_pages(&self, outline: &Outline, pages: &PagesText, name: &str) -> Vec<Section> {
        let extractor = SectionContentExtractor::new(name);
        let sections = if self.options.parallel {
            extractor.extract_parallel(&outline.headings, pages)
        } else {
            extractor.extract(&outline.headings, pages)
        };

        log::debug!(
            "{}: {} sections, {} empty",
            name,
            sections.len(),
            sections.iter().filter(|s| s.is_empty()).count()
        );
        sections
    }

    fn raw_pages_text<S: SpanSource>(&self, source: &S) -> Result<PagesText> {
        let mut pages = PagesText::new();
        for page in 1..=source.page_count() {
            match source.page_text(page) {
                Ok(text) => {
                    pages.insert(page, text);
                }
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping text of page {}: {}", page, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(pages)
    }

    fn source_spans<S: SpanSource>(&self, source: &S) -> Result<Vec<TextSpan>> {
        let count = source.page_count();
        if count == 0 {
            return Ok(Vec::new());
        }
        extract_range(source, 1..=count, self.options.error_mode)
    }

    /// Spans of a reopenable document: parallel over page ranges when
    /// configured, otherwise on the already open handle.
    fn collect_spans<S, F>(&self, source: &S, open: F) -> Result<Vec<TextSpan>>
    where
        S: SpanSource,
        F: Fn() -> Result<S> + Sync,
    {
        let count = source.page_count();
        if self.options.worker_count() > 1 && count > 1 {
            extract_spans(open, count, &self.options)
        } else {
            self.source_spans(source)
        }
    }
}

/// File name of a path, used to label documents and sections.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
