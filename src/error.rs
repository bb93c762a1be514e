//! Error types for the pdfoutline library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfoutline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building outlines and sections.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure or content streams.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// No text lines survived grouping and filtering.
    #[error("No text lines could be extracted from {0}")]
    EmptyDocument(String),

    /// The heading classifier could not be loaded.
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// The heading classifier failed to produce labels.
    #[error("Classification error: {0}")]
    Classifier(String),

    /// A classifier model file is structurally invalid.
    #[error("Invalid classifier model: {0}")]
    InvalidModel(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error should abort a whole batch run rather than a
    /// single document.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ClassifierUnavailable(_) | Error::InvalidModel(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyDocument("report.pdf".to_string());
        assert_eq!(
            err.to_string(),
            "No text lines could be extracted from report.pdf"
        );

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::ClassifierUnavailable("model.json".into()).is_fatal());
        assert!(!Error::EmptyDocument("a.pdf".into()).is_fatal());
        assert!(!Error::Encrypted.is_fatal());
    }
}
