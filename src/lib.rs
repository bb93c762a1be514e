//! # pdfoutline
//!
//! Heading outline and section extraction for PDF documents.
//!
//! Text spans are grouped into visual lines, each line gets a fixed-order
//! feature vector, and a pluggable heading classifier labels lines as title,
//! heading or body. The labels become a flat outline (`{title, outline}`)
//! that can be persisted as JSON and later used to cut the document into
//! per-heading sections.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfoutline::{extract_outline, extract_sections, render, JsonFormat};
//!
//! fn main() -> pdfoutline::Result<()> {
//!     let outline = extract_outline("report.pdf")?;
//!     println!("{}", render::outline_to_json(&outline, JsonFormat::Pretty)?);
//!
//!     for section in extract_sections("report.pdf", &outline)? {
//!         println!("{}: {} chars", section.section_title, section.content.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - [`source`]: spans from a [`SpanSource`], page ranges extracted in parallel
//! - [`layout`]: [`LineAssembler`] and [`FeatureEngineer`]
//! - [`classify`]: the [`HeadingClassifier`] seam plus two implementations
//! - [`outline`]: [`OutlineBuilder`]
//! - [`section`]: [`SectionContentExtractor`]
//! - [`batch`]: directories and multi-document collections

pub mod batch;
pub mod classify;
pub mod error;
pub mod layout;
pub mod model;
pub mod options;
pub mod outline;
pub mod pipeline;
pub mod render;
pub mod section;
pub mod source;

// Re-export commonly used types
pub use batch::{
    extract_collection, process_directory, BatchReport, CollectionInput, CollectionOutput,
};
pub use classify::{FontHeuristicClassifier, ForestClassifier, HeadingClassifier};
pub use error::{Error, Result};
pub use layout::{FeatureEngineer, LineAssembler};
pub use model::{
    BBox, DocumentMetadata, FeatureVector, FeaturedLine, Heading, HeadingLevel, Label, Line,
    Outline, Section, TextSpan,
};
pub use options::{ErrorMode, ExtractOptions, PageTextMode};
pub use outline::OutlineBuilder;
pub use pipeline::Pipeline;
pub use render::JsonFormat;
pub use section::{PagesText, SectionContentExtractor};
pub use source::{LopdfSource, SpanSource};

use std::path::Path;
use std::sync::Arc;

/// Build the outline of a PDF file with the font-size heuristic classifier.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::extract_outline;
///
/// let outline = extract_outline("document.pdf").unwrap();
/// println!("{}", outline.title);
/// ```
pub fn extract_outline<P: AsRef<Path>>(path: P) -> Result<Outline> {
    Pipeline::with_heuristics(ExtractOptions::default()).outline_from_path(path)
}

/// Build the outline of a PDF file with a given classifier and options.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pdfoutline::{extract_outline_with, ExtractOptions, ForestClassifier};
///
/// let model = ForestClassifier::from_path("heading_model.json")?;
/// let outline = extract_outline_with(
///     "document.pdf",
///     Arc::new(model),
///     ExtractOptions::new().lenient(),
/// )?;
/// # Ok::<(), pdfoutline::Error>(())
/// ```
pub fn extract_outline_with<P: AsRef<Path>>(
    path: P,
    classifier: Arc<dyn HeadingClassifier>,
    options: ExtractOptions,
) -> Result<Outline> {
    Pipeline::new(classifier, options).outline_from_path(path)
}

/// Extract the content of every heading in `outline` from a PDF file.
pub fn extract_sections<P: AsRef<Path>>(path: P, outline: &Outline) -> Result<Vec<Section>> {
    Pipeline::with_heuristics(ExtractOptions::default()).sections_from_path(path, outline)
}

/// Load a persisted outline artifact.
pub fn load_outline<P: AsRef<Path>>(path: P) -> Result<Outline> {
    Outline::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = extract_outline("/nonexistent/file.pdf").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "just some text").unwrap();
        assert!(matches!(extract_outline(&path), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_load_outline_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.json");
        std::fs::write(
            &path,
            r#"{"title": "Guide", "outline": [{"level": "H1", "text": "Setup", "page": 2}]}"#,
        )
        .unwrap();

        let outline = load_outline(&path).unwrap();
        assert_eq!(outline.title, "Guide");
        assert_eq!(outline.headings, vec![Heading::new(HeadingLevel::H1, "Setup", 2)]);
    }
}
