//! Rendering of outlines, sections and feature rows.

mod json;

pub use json::{
    features_to_json, outline_from_json, outline_to_json, sections_to_json, to_json, JsonFormat,
};
