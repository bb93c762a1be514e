//! Per-line classification features.

use serde::{Deserialize, Serialize};

use super::Line;

/// Number of features in a classifier row.
pub const FEATURE_COUNT: usize = 12;

/// Feature names in the fixed order expected by classifiers.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "page",
    "avg_font_size",
    "y_position",
    "is_bold",
    "is_all_caps",
    "text_len",
    "starts_with_numbering",
    "relative_font_size",
    "norm_y_pos",
    "is_centered",
    "space_before",
    "space_after",
];

/// Sentinel used for `space_before`/`space_after` when no neighbor exists
/// on the same page.
pub const NO_NEIGHBOR: f32 = -1.0;

/// Document-wide statistics used to normalize line features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Most frequent rounded average font size
    pub modal_font_size: f32,
}

impl Default for DocumentStats {
    fn default() -> Self {
        Self {
            modal_font_size: 10.0,
        }
    }
}

/// Feature vector for one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Page index (0-based)
    pub page: u32,
    pub avg_font_size: f32,
    pub y_position: f32,
    pub is_bold: bool,
    pub is_all_caps: bool,
    pub text_len: usize,
    pub starts_with_numbering: bool,
    pub relative_font_size: f32,
    pub norm_y_pos: f32,
    pub is_centered: bool,
    pub space_before: f32,
    pub space_after: f32,
}

impl FeatureVector {
    /// Numeric row in [`FEATURE_NAMES`] order; booleans become 0.0/1.0.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.page as f64,
            self.avg_font_size as f64,
            self.y_position as f64,
            flag(self.is_bold),
            flag(self.is_all_caps),
            self.text_len as f64,
            flag(self.starts_with_numbering),
            self.relative_font_size as f64,
            self.norm_y_pos as f64,
            flag(self.is_centered),
            self.space_before as f64,
            self.space_after as f64,
        ]
    }
}

/// A line together with its computed features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedLine {
    pub line: Line,
    pub features: FeatureVector,
}
