//! Extraction options and configuration.

use crate::layout::DEFAULT_Y_TOLERANCE;

/// Standard page size (US Letter, in points) used when a page has no
/// readable MediaBox.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Options for span extraction, line assembly and section extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for per-page failures
    pub error_mode: ErrorMode,

    /// Maximum vertical distance between spans on the same line
    pub y_tolerance: f32,

    /// Whether to extract page ranges in parallel
    pub parallel: bool,

    /// Number of page ranges to extract concurrently (None = thread pool size)
    pub workers: Option<usize>,

    /// Page size used when the document does not declare one
    pub default_page_size: (f32, f32),

    /// How page text is produced for section extraction
    pub text_mode: PageTextMode,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages that fail to decode).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the line grouping tolerance.
    pub fn with_y_tolerance(mut self, tolerance: f32) -> Self {
        self.y_tolerance = tolerance;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the number of concurrent page ranges.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Set the fallback page size.
    pub fn with_default_page_size(mut self, width: f32, height: f32) -> Self {
        self.default_page_size = (width, height);
        self
    }

    /// Set page text mode.
    pub fn with_text_mode(mut self, mode: PageTextMode) -> Self {
        self.text_mode = mode;
        self
    }

    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            y_tolerance: DEFAULT_Y_TOLERANCE,
            parallel: true,
            workers: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            text_mode: PageTextMode::Lines,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    #[default]
    Strict,
    /// Skip pages that cannot be decoded and continue
    Lenient,
}

/// Source of the per-page text used by section extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageTextMode {
    /// Page text is rebuilt from assembled lines, one line per row
    #[default]
    Lines,
    /// Page text comes from the PDF library's plain text extraction
    Raw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .lenient()
            .with_y_tolerance(3.5)
            .with_workers(4)
            .with_text_mode(PageTextMode::Raw);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.y_tolerance, 3.5);
        assert_eq!(options.worker_count(), 4);
        assert_eq!(options.text_mode, PageTextMode::Raw);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.y_tolerance, 2.0);
        assert_eq!(options.default_page_size, (612.0, 792.0));
        assert!(options.parallel);
    }

    #[test]
    fn test_sequential_uses_one_worker() {
        let options = ExtractOptions::new().with_workers(8).sequential();
        assert_eq!(options.worker_count(), 1);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let options = ExtractOptions::new().with_workers(0);
        assert_eq!(options.worker_count(), 1);
    }
}
