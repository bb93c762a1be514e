//! Strongly-typed records shared by every stage.
//!
//! Spans come from a span source, lines and feature vectors are transient
//! per run, and the [`Outline`] is the persisted artifact that later drives
//! section extraction.

mod features;
mod line;
mod metadata;
mod outline;
mod section;
mod span;

pub use features::{
    DocumentStats, FeatureVector, FeaturedLine, FEATURE_COUNT, FEATURE_NAMES, NO_NEIGHBOR,
};
pub use line::Line;
pub use metadata::DocumentMetadata;
pub use outline::{Heading, HeadingLevel, Label, Outline, TITLE_NOT_FOUND};
pub use section::Section;
pub use span::{BBox, StyleFlags, TextSpan};
