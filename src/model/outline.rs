//! Classifier labels, headings and the persisted outline artifact.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Title used when no line was labeled as a title.
pub const TITLE_NOT_FOUND: &str = "Title Not Found";

/// Level of an outline heading, carried as the classifier emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    /// Any other "H"-prefixed label (e.g. "H4") a model may produce.
    Other(String),
}

impl HeadingLevel {
    pub fn as_str(&self) -> &str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
            HeadingLevel::Other(s) => s,
        }
    }
}

impl From<String> for HeadingLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "H1" => HeadingLevel::H1,
            "H2" => HeadingLevel::H2,
            "H3" => HeadingLevel::H3,
            _ => HeadingLevel::Other(s),
        }
    }
}

impl From<HeadingLevel> for String {
    fn from(level: HeadingLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label assigned to a line by a heading classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Title,
    Heading(HeadingLevel),
    Body,
    /// Any other label a model may produce; ignored by the outline.
    Other(String),
}

impl Label {
    pub fn heading_level(&self) -> Option<&HeadingLevel> {
        match self {
            Label::Heading(level) => Some(level),
            _ => None,
        }
    }
}

impl FromStr for Label {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "Title" => Label::Title,
            "Body" => Label::Body,
            _ if s.starts_with('H') => Label::Heading(HeadingLevel::from(s.to_string())),
            _ => Label::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Title => f.write_str("Title"),
            Label::Heading(level) => write!(f, "{}", level),
            Label::Body => f.write_str("Body"),
            Label::Other(s) => f.write_str(s),
        }
    }
}

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
}

impl Heading {
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            text: text.into(),
            page,
        }
    }
}

/// Title plus flat, reading-ordered heading list for one document.
///
/// Serialized as `{"title": ..., "outline": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    #[serde(rename = "outline")]
    pub headings: Vec<Heading>,
}

impl Outline {
    pub fn new(title: impl Into<String>, headings: Vec<Heading>) -> Self {
        Self {
            title: title.into(),
            headings,
        }
    }

    /// Whether a title line was found.
    pub fn has_title(&self) -> bool {
        self.title != TITLE_NOT_FOUND
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
    }

    /// Load a persisted outline artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(Error::from)
    }
}

impl Default for Outline {
    fn default() -> Self {
        Self::new(TITLE_NOT_FOUND, Vec::new())
    }
}
