//! Outline assembly from classifier labels.

use std::sync::Arc;

use crate::classify::HeadingClassifier;
use crate::error::{Error, Result};
use crate::model::{FeatureVector, FeaturedLine, Heading, Label, Outline, TITLE_NOT_FOUND};

/// Runs a heading classifier over featured lines and assembles the outline.
#[derive(Clone)]
pub struct OutlineBuilder {
    classifier: Arc<dyn HeadingClassifier>,
}

impl OutlineBuilder {
    pub fn new(classifier: Arc<dyn HeadingClassifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &dyn HeadingClassifier {
        self.classifier.as_ref()
    }

    /// Classify all lines and build the outline.
    ///
    /// Fails if the classifier errors or returns the wrong number of labels.
    pub fn build(&self, lines: &[FeaturedLine]) -> Result<Outline> {
        if lines.is_empty() {
            return Ok(Outline::default());
        }

        let rows: Vec<FeatureVector> = lines.iter().map(|l| l.features.clone()).collect();
        let labels = self.classifier.predict(&rows)?;

        if labels.len() != lines.len() {
            return Err(Error::Classifier(format!(
                "{} returned {} labels for {} lines",
                self.classifier.name(),
                labels.len(),
                lines.len()
            )));
        }

        log::debug!(
            "{} labeled {} lines ({} headings)",
            self.classifier.name(),
            labels.len(),
            labels.iter().filter(|l| l.heading_level().is_some()).count()
        );

        Ok(assemble(lines, &labels))
    }
}

impl std::fmt::Debug for OutlineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineBuilder")
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

/// Combine lines with their labels into an outline.
///
/// Title lines are ordered by their bounding box tuple `(x0, y0, x1, y1)`
/// and joined with single spaces. Headings keep reading order and report
/// 1-indexed pages.
pub fn assemble(lines: &[FeaturedLine], labels: &[Label]) -> Outline {
    let mut title_lines: Vec<&FeaturedLine> = lines
        .iter()
        .zip(labels)
        .filter(|(_, label)| **label == Label::Title)
        .map(|(line, _)| line)
        .collect();
    title_lines.sort_by(|a, b| a.line.bbox.tuple_cmp(&b.line.bbox));

    let title = if title_lines.is_empty() {
        TITLE_NOT_FOUND.to_string()
    } else {
        title_lines
            .iter()
            .map(|l| l.line.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let headings = lines
        .iter()
        .zip(labels)
        .filter_map(|(line, label)| {
            label
                .heading_level()
                .map(|level| Heading::new(level.clone(), line.line.text.clone(), line.features.page + 1))
        })
        .collect();

    Outline::new(title, headings)
}
