//! Decision-tree ensemble classifier loaded from an exported JSON model.
//!
//! Model format:
//!
//! ```json
//! {
//!   "feature_names": ["page", "avg_font_size", ...],
//!   "classes": ["Body", "H1", "H2", "H3", "Title"],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 7, "threshold": 1.25, "left": 1, "right": 2 },
//!         { "value": [40.0, 0.0, 0.0, 0.0, 0.0] },
//!         { "value": [1.0, 12.0, 3.0, 0.0, 2.0] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Splits send a row left when `row[feature] <= threshold`. Leaf values are
//! per-class weights; each tree's leaf is normalized and the ensemble
//! predicts the class with the largest summed probability.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{FeatureVector, Label, FEATURE_COUNT, FEATURE_NAMES};

use super::HeadingClassifier;

/// A node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A single decision tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree and return the leaf weights for a row.
    fn leaf(&self, row: &[f64; FEATURE_COUNT]) -> Result<&[f64]> {
        let mut index = 0;
        // A valid tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return Ok(value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        Err(Error::InvalidModel("tree contains a cycle".to_string()))
    }

    fn validate(&self, class_count: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::InvalidModel("tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(Error::InvalidModel(format!(
                            "node {} splits on unknown feature {}",
                            i, feature
                        )));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(Error::InvalidModel(format!(
                            "node {} has a child outside the tree",
                            i
                        )));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != class_count {
                        return Err(Error::InvalidModel(format!(
                            "leaf {} has {} values for {} classes",
                            i,
                            value.len(),
                            class_count
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForestModel {
    feature_names: Vec<String>,
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
}

/// Ensemble of decision trees with majority-probability voting.
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    classes: Vec<Label>,
    trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    /// Load a model file. Any failure means the classifier is unavailable.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::ClassifierUnavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&data).map_err(|e| {
            Error::ClassifierUnavailable(format!("{}: {}", path.display(), e))
        })
    }

    /// Parse and validate a model from JSON text.
    pub fn from_json(data: &str) -> Result<Self> {
        let model: ForestModel = serde_json::from_str(data)?;

        if model.feature_names != FEATURE_NAMES {
            return Err(Error::InvalidModel(format!(
                "feature order {:?} does not match {:?}",
                model.feature_names, FEATURE_NAMES
            )));
        }
        if model.classes.is_empty() {
            return Err(Error::InvalidModel("model has no classes".to_string()));
        }
        if model.trees.is_empty() {
            return Err(Error::InvalidModel("model has no trees".to_string()));
        }
        for tree in &model.trees {
            tree.validate(model.classes.len())?;
        }

        let classes = model
            .classes
            .iter()
            .map(|c| c.parse::<Label>().unwrap_or_else(|never| match never {}))
            .collect();

        Ok(Self {
            classes,
            trees: model.trees,
        })
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> Result<Label> {
        let mut votes = vec![0.0; self.classes.len()];

        for tree in &self.trees {
            let leaf = tree.leaf(row)?;
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (vote, weight) in votes.iter_mut().zip(leaf) {
                *vote += weight / total;
            }
        }

        // First class wins ties.
        let best = votes
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > votes[best] { i } else { best });
        Ok(self.classes[best].clone())
    }
}

impl HeadingClassifier for ForestClassifier {
    fn name(&self) -> &str {
        "decision-forest"
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>> {
        rows.iter()
            .map(|row| self.predict_row(&row.to_row()))
            .collect()
    }
}
