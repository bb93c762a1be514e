//! JSON rendering for outlines, sections and feature rows.

use serde::Serialize;

use crate::error::Result;
use crate::model::{FeatureVector, FeaturedLine, Outline, Section};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value in the given format.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Render the persisted outline artifact.
pub fn outline_to_json(outline: &Outline, format: JsonFormat) -> Result<String> {
    to_json(outline, format)
}

/// Parse a persisted outline artifact.
pub fn outline_from_json(json: &str) -> Result<Outline> {
    Ok(serde_json::from_str(json)?)
}

pub fn sections_to_json(sections: &[Section], format: JsonFormat) -> Result<String> {
    to_json(sections, format)
}

/// One exported feature row: the line text plus its features.
#[derive(Serialize)]
struct FeatureRecord<'a> {
    text: &'a str,
    #[serde(flatten)]
    features: &'a FeatureVector,
}

/// Render feature rows, one object per line.
pub fn features_to_json(lines: &[FeaturedLine], format: JsonFormat) -> Result<String> {
    let records: Vec<FeatureRecord<'_>> = lines
        .iter()
        .map(|l| FeatureRecord {
            text: &l.line.text,
            features: &l.features,
        })
        .collect();
    to_json(&records, format)
}
