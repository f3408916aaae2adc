//! Candidate re-matching
//!
//! A picker UI chooses a candidate from one search, but the transfer runs
//! against a fresh search issued later; the network snapshot may have
//! changed in between. This module re-locates the remembered candidate in
//! the fresh results through progressively looser tiers.

use tracing::warn;
use tunegrab_common::model::{Candidate, RawResult};

/// Re-locate `wanted` in a fresh result set.
///
/// Tiers, first hit wins:
/// 1. same normalized path and same owning peer
/// 2. same normalized path, any peer
/// 3. same basename and extension
/// 4. first remaining audio result, regardless of name
///
/// Returns `None` when even tier 4 is empty; the source is gone.
pub fn rematch(wanted: &Candidate, fresh: &[RawResult]) -> Option<Candidate> {
    let wanted_path = normalize_path(&wanted.file);
    let wanted_base = basename(&wanted.file);
    let wanted_user = wanted.user.to_lowercase();

    let exact = fresh.iter().find(|r| {
        normalize_path(&r.file) == wanted_path && r.username.to_lowercase() == wanted_user
    });

    let by_path = || fresh.iter().find(|r| normalize_path(&r.file) == wanted_path);

    let by_basename = || {
        fresh.iter().find(|r| {
            basename(&r.file) == wanted_base
                && tunegrab_common::model::extension_of(&r.file).as_deref()
                    == Some(wanted.extension.as_str())
        })
    };

    if let Some(candidate) = exact
        .or_else(by_path)
        .or_else(by_basename)
        .and_then(Candidate::from_raw)
    {
        return Some(candidate);
    }

    warn!(file = %wanted.file, "No strong match, falling back to first audio candidate");
    fresh.iter().find_map(Candidate::from_raw)
}

/// Lower-case, forward slashes, collapsed whitespace
fn normalize_path(path: &str) -> String {
    path.to_lowercase()
        .replace('\\', "/")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last segment of the normalized path
fn basename(path: &str) -> String {
    let normalized = normalize_path(path);
    normalized
        .rsplit('/')
        .next()
        .unwrap_or(&normalized)
        .to_string()
}
