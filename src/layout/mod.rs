//! Line assembly and feature engineering.
//!
//! Both stages run sequentially over the merged, reading-ordered span list
//! because a line's features depend on its immediate neighbors.

mod assembler;
mod features;

pub use assembler::{normalize_line_text, sort_spans, LineAssembler, DEFAULT_Y_TOLERANCE};
pub use features::{
    document_stats, is_all_caps, is_bold_font, starts_with_numbering, FeatureEngineer,
};
