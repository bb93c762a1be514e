//! Rule-based classifier driven by the document's font size hierarchy.

use crate::error::Result;
use crate::model::{FeatureVector, HeadingLevel, Label};

use super::HeadingClassifier;

/// Thresholds for [`FontHeuristicClassifier`].
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Points above the body size a line must reach to be a heading
    pub min_size_delta: f32,
    /// Sizes within this many points are treated as the same heading tier
    pub size_merge_tolerance: f32,
    /// Minimum size ratio to body text for a title line
    pub title_min_ratio: f32,
    /// Title lines must sit above this normalized vertical position
    pub title_max_norm_y: f32,
    /// Longer lines are never headings
    pub max_heading_len: usize,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            min_size_delta: 1.5,
            size_merge_tolerance: 0.5,
            title_min_ratio: 1.5,
            title_max_norm_y: 0.5,
            max_heading_len: 120,
        }
    }
}

/// Assigns heading levels by ranking the font sizes that stand out from
/// body text: the largest tier becomes H1, the next H2, everything smaller
/// H3. The largest text near the top of the first page becomes the title.
/// Bold numbered lines at body size are H3.
#[derive(Debug, Clone, Default)]
pub struct FontHeuristicClassifier {
    config: HeuristicConfig,
}

impl FontHeuristicClassifier {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    fn body_size(row: &FeatureVector) -> f32 {
        if row.relative_font_size > 0.0 {
            row.avg_font_size / row.relative_font_size
        } else {
            row.avg_font_size
        }
    }

    fn is_heading_candidate(&self, row: &FeatureVector) -> bool {
        row.text_len <= self.config.max_heading_len
            && row.avg_font_size >= Self::body_size(row) + self.config.min_size_delta
    }

    /// Distinct heading sizes, largest first, merged within tolerance.
    fn heading_tiers(&self, rows: &[FeatureVector]) -> Vec<f32> {
        let mut sizes: Vec<f32> = rows
            .iter()
            .filter(|r| self.is_heading_candidate(r))
            .map(|r| r.avg_font_size)
            .collect();
        sizes.sort_by(|a, b| b.total_cmp(a));

        let mut tiers: Vec<f32> = Vec::new();
        for size in sizes {
            match tiers.last() {
                Some(&last) if last - size <= self.config.size_merge_tolerance => {}
                _ => tiers.push(size),
            }
        }
        tiers
    }

    fn level_for(&self, size: f32, tiers: &[f32]) -> HeadingLevel {
        let rank = tiers
            .iter()
            .position(|&tier| size >= tier - self.config.size_merge_tolerance)
            .unwrap_or(tiers.len());
        match rank {
            0 => HeadingLevel::H1,
            1 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }

    fn is_title(&self, row: &FeatureVector, largest: f32) -> bool {
        row.page == 0
            && row.relative_font_size >= self.config.title_min_ratio
            && row.norm_y_pos <= self.config.title_max_norm_y
            && (largest - row.avg_font_size).abs() <= self.config.size_merge_tolerance
    }
}

impl HeadingClassifier for FontHeuristicClassifier {
    fn name(&self) -> &str {
        "font-heuristic"
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>> {
        let tiers = self.heading_tiers(rows);
        let largest = tiers.first().copied().unwrap_or(f32::MAX);

        log::debug!("Heading size tiers: {:?}", tiers);

        let labels = rows
            .iter()
            .map(|row| {
                if self.is_heading_candidate(row) {
                    if self.is_title(row, largest) {
                        Label::Title
                    } else {
                        Label::Heading(self.level_for(row.avg_font_size, &tiers))
                    }
                } else if row.is_bold
                    && row.starts_with_numbering
                    && row.text_len <= self.config.max_heading_len
                {
                    Label::Heading(HeadingLevel::H3)
                } else {
                    Label::Body
                }
            })
            .collect();

        Ok(labels)
    }
}
