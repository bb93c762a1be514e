//! Per-line feature computation for heading classification.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{DocumentStats, FeatureVector, FeaturedLine, Line, NO_NEIGHBOR};
use crate::options::DEFAULT_PAGE_SIZE;

/// Font name fragments that mark a bold face.
const BOLD_MARKERS: [&str; 4] = ["bold", "black", "heavy", "semibold"];

/// Horizontal distance from the page center, as a fraction of page width,
/// within which a line counts as centered.
const CENTER_TOLERANCE: f32 = 0.1;

/// Compute the modal rounded line font size for a document.
///
/// Sizes are rounded to two decimals. Ties go to the size seen first.
/// Returns the default statistics when there are no lines.
pub fn document_stats(lines: &[Line]) -> DocumentStats {
    let mut counts: HashMap<i64, (usize, usize)> = HashMap::new();

    for (order, line) in lines.iter().filter(|l| !l.text.is_empty()).enumerate() {
        let key = (line.avg_font_size as f64 * 100.0).round() as i64;
        counts.entry(key).or_insert((0, order)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(key, _)| DocumentStats {
            modal_font_size: key as f32 / 100.0,
        })
        .unwrap_or_default()
}

/// Computes feature vectors relative to document statistics and page size.
///
/// Features for a line depend on its neighbors on the same page, so lines
/// are processed sequentially in reading order.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEngineer {
    page_width: f32,
    page_height: f32,
}

impl FeatureEngineer {
    /// Create an engineer for the given page size. Non-positive dimensions
    /// fall back to the standard page size.
    pub fn new(page_width: f32, page_height: f32) -> Self {
        if page_width > 0.0 && page_height > 0.0 {
            return Self {
                page_width,
                page_height,
            };
        }

        log::warn!(
            "Invalid page size {}x{}, using {}x{}",
            page_width,
            page_height,
            DEFAULT_PAGE_SIZE.0,
            DEFAULT_PAGE_SIZE.1
        );
        Self {
            page_width: DEFAULT_PAGE_SIZE.0,
            page_height: DEFAULT_PAGE_SIZE.1,
        }
    }

    pub fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    /// Attach a feature vector to every line.
    pub fn compute(&self, lines: Vec<Line>, stats: &DocumentStats) -> Vec<FeaturedLine> {
        let features: Vec<FeatureVector> = (0..lines.len())
            .map(|i| self.line_features(&lines, i, stats))
            .collect();

        lines
            .into_iter()
            .zip(features)
            .map(|(line, features)| FeaturedLine { line, features })
            .collect()
    }

    fn line_features(&self, lines: &[Line], i: usize, stats: &DocumentStats) -> FeatureVector {
        let line = &lines[i];

        let relative_font_size = if stats.modal_font_size > 0.0 {
            line.avg_font_size / stats.modal_font_size
        } else {
            1.0
        };

        let page_center = self.page_width / 2.0;
        let is_centered =
            (line.bbox.center_x() - page_center).abs() < CENTER_TOLERANCE * self.page_width;

        let space_before = i
            .checked_sub(1)
            .map(|p| &lines[p])
            .filter(|prev| prev.page == line.page)
            .map_or(NO_NEIGHBOR, |prev| line.bbox.y0 - prev.bbox.y1);

        let space_after = lines
            .get(i + 1)
            .filter(|next| next.page == line.page)
            .map_or(NO_NEIGHBOR, |next| next.bbox.y0 - line.bbox.y1);

        FeatureVector {
            page: line.page.saturating_sub(1),
            avg_font_size: line.avg_font_size,
            y_position: line.y_position,
            is_bold: is_bold_font(&line.font_name),
            is_all_caps: is_all_caps(&line.text),
            text_len: line.text.chars().count(),
            starts_with_numbering: starts_with_numbering(&line.text),
            relative_font_size,
            norm_y_pos: line.y_position / self.page_height,
            is_centered,
            space_before,
            space_after,
        }
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1)
    }
}

/// Whether a font name denotes a bold face.
pub fn is_bold_font(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    BOLD_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Uppercase text longer than three characters.
///
/// Text without any cased character (digits, punctuation) is not uppercase.
pub fn is_all_caps(text: &str) -> bool {
    let has_upper = text.chars().any(char::is_uppercase);
    let has_lower = text.chars().any(char::is_lowercase);
    has_upper && !has_lower && text.chars().count() > 3
}

fn numbering_pattern() -> &'static Regex {
    static NUMBERING: OnceLock<Regex> = OnceLock::new();
    NUMBERING.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:Chapter|Section)\s+\w+|\d{1,2}(?:\.\d{1,2})*\.?|[A-Z]\.|\([a-z]\)|[ivx]+\.)",
        )
        .expect("valid numbering pattern")
    })
}

/// Whether text starts with a chapter/section marker or outline numbering.
pub fn starts_with_numbering(text: &str) -> bool {
    numbering_pattern().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn line(text: &str, page: u32, size: f32, bbox: BBox) -> Line {
        Line {
            text: text.to_string(),
            page,
            avg_font_size: size,
            bbox,
            y_position: bbox.y0,
            font_name: "Helvetica".to_string(),
        }
    }

    #[test]
    fn test_document_stats_mode() {
        let lines = vec![
            line("a", 1, 18.0, BBox::default()),
            line("b", 1, 10.0, BBox::default()),
            line("c", 1, 10.0, BBox::default()),
            line("d", 2, 12.004, BBox::default()),
        ];
        assert_eq!(document_stats(&lines).modal_font_size, 10.0);
    }

    #[test]
    fn test_document_stats_tie_prefers_first_seen() {
        let lines = vec![
            line("a", 1, 14.0, BBox::default()),
            line("b", 1, 11.0, BBox::default()),
        ];
        assert_eq!(document_stats(&lines).modal_font_size, 14.0);
    }

    #[test]
    fn test_document_stats_rounds_sizes() {
        let lines = vec![
            line("a", 1, 11.001, BBox::default()),
            line("b", 1, 10.999, BBox::default()),
            line("c", 1, 9.0, BBox::default()),
        ];
        assert_eq!(document_stats(&lines).modal_font_size, 11.0);
    }

    #[test]
    fn test_document_stats_empty() {
        assert_eq!(document_stats(&[]).modal_font_size, 10.0);
    }

    #[test]
    fn test_bold_detection() {
        assert!(is_bold_font("Arial-BoldMT"));
        assert!(is_bold_font("Roboto-Black"));
        assert!(is_bold_font("SourceSans-SemiBold"));
        assert!(is_bold_font("Avenir-Heavy"));
        assert!(!is_bold_font("Helvetica-Oblique"));
    }

    #[test]
    fn test_all_caps_requires_length() {
        assert!(is_all_caps("INTRODUCTION"));
        assert!(is_all_caps("PART 1"));
        assert!(!is_all_caps("ABC"));
        assert!(!is_all_caps("A"));
        assert!(!is_all_caps("Introduction"));
        assert!(!is_all_caps("1234"));
    }

    #[test]
    fn test_numbering_patterns() {
        assert!(starts_with_numbering("Chapter 3 Results"));
        assert!(starts_with_numbering("Section IV"));
        assert!(starts_with_numbering("1 Introduction"));
        assert!(starts_with_numbering("1.2 Scope"));
        assert!(starts_with_numbering("1.2.3. Details"));
        assert!(starts_with_numbering("A. Appendix"));
        assert!(starts_with_numbering("(b) second item"));
        assert!(starts_with_numbering("iv. fourth"));
        assert!(starts_with_numbering("   2. indented"));
        assert!(!starts_with_numbering("Introduction"));
        assert!(!starts_with_numbering("a. lowercase letter"));
    }

    #[test]
    fn test_compute_features() {
        let lines = vec![
            line("OVERVIEW", 1, 20.0, BBox::new(256.0, 72.0, 356.0, 92.0)),
            line("Body text here", 1, 10.0, BBox::new(72.0, 100.0, 300.0, 110.0)),
            line("Next page text", 2, 10.0, BBox::new(72.0, 72.0, 300.0, 82.0)),
        ];
        let stats = document_stats(&lines);
        let featured = FeatureEngineer::new(612.0, 792.0).compute(lines, &stats);

        let title = &featured[0].features;
        assert_eq!(title.page, 0);
        assert_eq!(title.relative_font_size, 2.0);
        assert!(title.is_all_caps);
        assert!(title.is_centered);
        assert_eq!(title.space_before, NO_NEIGHBOR);
        assert_eq!(title.space_after, 8.0);
        assert_eq!(title.text_len, 8);
        assert!((title.norm_y_pos - 72.0 / 792.0).abs() < 1e-6);

        let body = &featured[1].features;
        assert_eq!(body.space_before, 8.0);
        assert_eq!(body.space_after, NO_NEIGHBOR);
        assert!(!body.is_centered);
        assert_eq!(body.relative_font_size, 1.0);

        let next = &featured[2].features;
        assert_eq!(next.page, 1);
        assert_eq!(next.space_before, NO_NEIGHBOR);
        assert_eq!(next.space_after, NO_NEIGHBOR);
    }

    #[test]
    fn test_zero_modal_size_gives_unit_ratio() {
        let lines = vec![line("x", 1, 12.0, BBox::default())];
        let stats = DocumentStats {
            modal_font_size: 0.0,
        };
        let featured = FeatureEngineer::default().compute(lines, &stats);
        assert_eq!(featured[0].features.relative_font_size, 1.0);
    }

    #[test]
    fn test_invalid_page_size_falls_back() {
        let engineer = FeatureEngineer::new(0.0, -1.0);
        assert_eq!(engineer.page_size(), (612.0, 792.0));
    }

    #[test]
    fn test_features_deterministic() {
        let make = || {
            vec![
                line("1. Scope", 1, 14.0, BBox::new(72.0, 90.0, 200.0, 104.0)),
                line("text", 1, 10.0, BBox::new(72.0, 110.0, 200.0, 120.0)),
            ]
        };
        let engineer = FeatureEngineer::new(595.0, 842.0);
        let a = engineer.compute(make(), &document_stats(&make()));
        let b = engineer.compute(make(), &document_stats(&make()));
        assert_eq!(a, b);
    }
}
