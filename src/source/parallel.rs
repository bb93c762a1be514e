//! Page-range fan-out for span extraction.

use std::ops::RangeInclusive;

use rayon::prelude::*;

use crate::error::Result;
use crate::model::TextSpan;
use crate::options::{ErrorMode, ExtractOptions};

use super::SpanSource;

/// Split pages `1..=page_count` into contiguous ranges, one per worker.
///
/// Each range holds `page_count / workers + 1` pages (the last may be
/// shorter); empty ranges are dropped.
pub fn partition_pages(page_count: u32, workers: usize) -> Vec<RangeInclusive<u32>> {
    let workers = workers.max(1) as u32;
    let size = page_count / workers + 1;

    (1..=page_count)
        .step_by(size as usize)
        .map(|start| start..=(start + size - 1).min(page_count))
        .collect()
}

/// Extract spans for a page range from one source, in page order.
///
/// In lenient mode pages that fail are skipped with a warning.
pub fn extract_range<S: SpanSource>(
    source: &S,
    pages: RangeInclusive<u32>,
    error_mode: ErrorMode,
) -> Result<Vec<TextSpan>> {
    let mut spans = Vec::new();
    for page in pages {
        match source.page_spans(page) {
            Ok(page_spans) => spans.extend(page_spans),
            Err(e) if error_mode == ErrorMode::Lenient && !e.is_fatal() => {
                log::warn!("Skipping page {}: {}", page, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(spans)
}

/// Extract all spans of a document.
///
/// Pages are partitioned into contiguous ranges; each range is extracted on
/// the rayon pool through its own handle from `open`, and the results are
/// concatenated in range order once every range has finished.
pub fn extract_spans<S, F>(open: F, page_count: u32, options: &ExtractOptions) -> Result<Vec<TextSpan>>
where
    S: SpanSource,
    F: Fn() -> Result<S> + Sync,
{
    let ranges = partition_pages(page_count, options.worker_count());
    log::debug!("Extracting {} pages in {} ranges", page_count, ranges.len());

    if ranges.len() <= 1 {
        let source = open()?;
        return extract_range(&source, 1..=page_count, options.error_mode);
    }

    let chunks: Vec<Vec<TextSpan>> = ranges
        .into_par_iter()
        .map(|range| {
            let source = open()?;
            extract_range(&source, range, options.error_mode)
        })
        .collect::<Result<_>>()?;

    Ok(chunks.into_iter().flatten().collect())
}
