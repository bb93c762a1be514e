//! Section records produced from an outline.

use serde::{Deserialize, Serialize};

use super::HeadingLevel;

/// The text content attributed to one outline heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Source file name (no directory)
    pub document_name: String,
    pub section_title: String,
    pub content: String,
    /// Page number of the heading (1-indexed)
    pub page_number: u32,
    pub heading_level: HeadingLevel,
    /// Reserved; headings are flat so this is always empty.
    pub parent_sections: Vec<String>,
}

impl Section {
    /// Stable identifier for the `index`-th section of a document.
    pub fn section_id(&self, index: usize) -> String {
        format!("{}_{}_{}", self.document_name, self.page_number, index)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
