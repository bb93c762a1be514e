//! Positioned text spans as produced by a span source.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in top-down page coordinates.
///
/// `y0` is the top edge and `y1` the bottom edge; y grows down the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Horizontal midpoint.
    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Lexicographic comparison on `(x0, y0, x1, y1)`.
    pub fn tuple_cmp(&self, other: &BBox) -> std::cmp::Ordering {
        self.x0
            .total_cmp(&other.x0)
            .then(self.y0.total_cmp(&other.y0))
            .then(self.x1.total_cmp(&other.x1))
            .then(self.y1.total_cmp(&other.y1))
    }
}

/// Style bits attached to a span.
///
/// Bit layout: superscript = 1, italic = 2, serif = 4, monospaced = 8,
/// bold = 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleFlags(u32);

impl StyleFlags {
    pub const SUPERSCRIPT: u32 = 1;
    pub const ITALIC: u32 = 2;
    pub const SERIF: u32 = 4;
    pub const MONOSPACED: u32 = 8;
    pub const BOLD: u32 = 16;

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Derive style bits from a font's base name (e.g. "Times-BoldItalic").
    pub fn from_font_name(font_name: &str) -> Self {
        let lower = font_name.to_lowercase();
        let mut bits = 0;
        if ["bold", "black", "heavy"].iter().any(|m| lower.contains(m)) {
            bits |= Self::BOLD;
        }
        if lower.contains("italic") || lower.contains("oblique") {
            bits |= Self::ITALIC;
        }
        if lower.contains("courier") || lower.contains("mono") {
            bits |= Self::MONOSPACED;
        }
        if lower.contains("times") || (lower.contains("serif") && !lower.contains("sans")) {
            bits |= Self::SERIF;
        }
        Self(bits)
    }
}

/// A contiguous run of text sharing one font, with its position on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Style bits
    pub flags: StyleFlags,
    /// Page number (1-indexed)
    pub page: u32,
    /// Bounding box in top-down coordinates
    pub bbox: BBox,
    /// Vertical position used for line grouping (top of the box)
    pub y_position: f32,
}

impl TextSpan {
    /// Create a span whose `y_position` is the top of its box.
    pub fn new(
        text: impl Into<String>,
        font_size: f32,
        font_name: impl Into<String>,
        page: u32,
        bbox: BBox,
    ) -> Self {
        let font_name = font_name.into();
        Self {
            text: text.into(),
            font_size,
            flags: StyleFlags::from_font_name(&font_name),
            font_name,
            page,
            y_position: bbox.y0,
            bbox,
        }
    }

    /// Reading-order comparison: page, then vertical position, then left edge.
    pub fn reading_order(&self, other: &TextSpan) -> std::cmp::Ordering {
        self.page
            .cmp(&other.page)
            .then(self.y_position.total_cmp(&other.y_position))
            .then(self.bbox.x0.total_cmp(&other.bbox.x0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_union() {
        let a = BBox::new(10.0, 20.0, 50.0, 30.0);
        let b = BBox::new(40.0, 18.0, 90.0, 29.0);
        assert_eq!(a.union(&b), BBox::new(10.0, 18.0, 90.0, 30.0));
    }

    #[test]
    fn test_style_flags_from_font_name() {
        let flags = StyleFlags::from_font_name("Times-BoldItalic");
        assert!(flags.contains(StyleFlags::BOLD));
        assert!(flags.contains(StyleFlags::ITALIC));
        assert!(flags.contains(StyleFlags::SERIF));
        assert!(!flags.contains(StyleFlags::MONOSPACED));

        let flags = StyleFlags::from_font_name("Helvetica");
        assert_eq!(flags.bits(), 0);
    }

    #[test]
    fn test_reading_order() {
        let a = TextSpan::new("a", 10.0, "Helvetica", 1, BBox::new(200.0, 80.0, 220.0, 90.0));
        let b = TextSpan::new("b", 10.0, "Helvetica", 1, BBox::new(50.0, 100.0, 70.0, 110.0));
        let c = TextSpan::new("c", 10.0, "Helvetica", 2, BBox::new(0.0, 10.0, 20.0, 20.0));
        assert!(a.reading_order(&b).is_lt());
        assert!(b.reading_order(&c).is_lt());
    }
}
