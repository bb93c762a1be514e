//! Visual text lines assembled from spans.

use serde::{Deserialize, Serialize};

use super::{BBox, TextSpan};

/// A reading-order group of spans judged to sit on the same visual line.
///
/// A line is a derived view: it keeps only the aggregated values, not the
/// spans themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Concatenated, normalized text
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Arithmetic mean of the span font sizes
    pub avg_font_size: f32,
    /// Union of the span boxes
    pub bbox: BBox,
    /// Vertical position of the first span
    pub y_position: f32,
    /// Font name of the first span
    pub font_name: String,
}

impl Line {
    /// Aggregate spans (already in horizontal order) into a line with the
    /// given normalized text. Returns `None` for an empty span list.
    pub fn from_spans<'a, I>(spans: I, text: String) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TextSpan>,
    {
        let mut spans = spans.into_iter();
        let first = spans.next()?;

        let mut bbox = first.bbox;
        let mut size_sum = first.font_size;
        let mut count = 1usize;
        for span in spans {
            bbox = bbox.union(&span.bbox);
            size_sum += span.font_size;
            count += 1;
        }

        Some(Self {
            text,
            page: first.page,
            avg_font_size: size_sum / count as f32,
            bbox,
            y_position: first.y_position,
            font_name: first.font_name.clone(),
        })
    }

    /// Whether `other` follows this line in reading order (page, then y).
    pub fn precedes(&self, other: &Line) -> bool {
        self.page < other.page
            || (self.page == other.page && self.y_position <= other.y_position)
    }
}
