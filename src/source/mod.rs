//! Span sources.
//!
//! A [`SpanSource`] turns one document into positioned text spans, page by
//! page. [`LopdfSource`] is the PDF-backed implementation; tests and other
//! engines can plug in their own.

mod detect;
mod pdf;
mod parallel;

pub use self::detect::{detect_bytes, detect_path, is_pdf, PdfVersion};
pub use self::pdf::LopdfSource;
pub use self::parallel::{extract_range, extract_spans, partition_pages};

use crate::error::Result;
use crate::model::TextSpan;

/// Page-level access to a document's positioned text.
///
/// Pages are 1-indexed.
pub trait SpanSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Page width and height in points, if the document declares them.
    fn page_size(&self, page: u32) -> Option<(f32, f32)>;

    /// Text spans of one page, in content stream order.
    fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>>;

    /// Plain text of one page.
    fn page_text(&self, page: u32) -> Result<String>;
}

impl<S: SpanSource + ?Sized> SpanSource for &S {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page_size(&self, page: u32) -> Option<(f32, f32)> {
        (**self).page_size(page)
    }

    fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
        (**self).page_spans(page)
    }

    fn page_text(&self, page: u32) -> Result<String> {
        (**self).page_text(page)
    }
}
