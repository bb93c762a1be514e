//! Heading classifiers.
//!
//! The outline builder consumes a classifier only through the
//! [`HeadingClassifier`] trait, so trained models, rule sets and test
//! doubles are interchangeable.

mod forest;
mod heuristic;

pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use heuristic::{FontHeuristicClassifier, HeuristicConfig};

use crate::error::Result;
use crate::model::{FeatureVector, Label};

/// Maps feature vectors to line labels.
pub trait HeadingClassifier: Send + Sync {
    /// Classifier name for logging.
    fn name(&self) -> &str;

    /// Predict one label per row, in row order.
    ///
    /// Rows belong to a single document and arrive in reading order.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>>;
}
