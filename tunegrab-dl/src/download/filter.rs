//! Candidate filtering
//!
//! Reduces raw search results to audio candidates that are consistent with
//! the requested title and, for actual transfers, currently downloadable.

use tunegrab_common::model::{Candidate, RawResult};

/// What the filtered candidates will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Listing sources for a picker UI; busy peers are still shown
    Preview,
    /// Feeding the transfer queue; peers must have a free upload slot
    Transfer,
}

/// Filter raw results down to usable candidates for `title`.
///
/// Drops results without a file name, with a non-audio extension, or whose
/// "remix" marker disagrees with the requested title. `Transfer` mode
/// additionally requires at least one free upload slot.
pub fn filter_results(results: &[RawResult], title: &str, mode: SearchMode) -> Vec<Candidate> {
    results
        .iter()
        .filter(|r| mode == SearchMode::Preview || r.slots >= 1)
        .filter(|r| remix_consistent(&r.file, title))
        .filter_map(Candidate::from_raw)
        .collect()
}

/// A file name mentioning "remix" only matches a title that mentions
/// "remix", and a file name that does not, only a title that does not.
/// Keeps remixes out of original-version requests and vice versa.
pub fn remix_consistent(file: &str, title: &str) -> bool {
    let file_is_remix = file.to_lowercase().contains("remix");
    let title_is_remix = title.to_lowercase().contains("remix");
    file_is_remix == title_is_remix
}
