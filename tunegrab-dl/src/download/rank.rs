//! Candidate ranking
//!
//! Orders a filtered candidate set by the quality policy. With a format
//! preference the set is partitioned into preferred / fallback / other
//! groups and only the best available group is used: preferred sources are
//! exhausted in full before a fallback type is ever considered. Without a
//! preference the whole set is ordered by a fixed format priority.

use tunegrab_common::model::Candidate;

/// Requested file type preference, normalized to lower-case extensions
/// without a leading dot
#[derive(Debug, Clone, Default)]
pub struct FormatPreference {
    pub preferred: Option<String>,
    pub fallback: Option<String>,
}

impl FormatPreference {
    /// Normalize raw preference strings. A fallback equal to the preferred
    /// type is redundant and dropped.
    pub fn new(preferred: Option<&str>, fallback: Option<&str>) -> Self {
        let normalize =
            |s: &str| Some(s.trim().trim_start_matches('.').to_lowercase()).filter(|s| !s.is_empty());

        let preferred = preferred.and_then(normalize);
        let fallback = fallback.and_then(normalize).filter(|f| Some(f) != preferred.as_ref());

        Self { preferred, fallback }
    }

    pub fn is_empty(&self) -> bool {
        self.preferred.is_none() && self.fallback.is_none()
    }
}

/// Rank candidates into the attempt order.
///
/// The returned ordering is total and must not be re-sorted mid-session.
pub fn rank(candidates: Vec<Candidate>, prefs: &FormatPreference) -> Vec<Candidate> {
    if prefs.is_empty() {
        return rank_by_format_priority(candidates);
    }

    let mut preferred = Vec::new();
    let mut fallback = Vec::new();
    let mut other = Vec::new();

    for candidate in candidates {
        if Some(&candidate.extension) == prefs.preferred.as_ref() {
            preferred.push(candidate);
        } else if Some(&candidate.extension) == prefs.fallback.as_ref() {
            fallback.push(candidate);
        } else {
            other.push(candidate);
        }
    }

    // Only the best non-empty group is attempted
    let mut group = if !preferred.is_empty() {
        preferred
    } else if !fallback.is_empty() {
        fallback
    } else {
        other
    };

    sort_by_quality(&mut group);
    group
}

/// Descending quality within a group: bitrate when reported, advertised
/// speed otherwise, ties broken by size
fn sort_by_quality(group: &mut [Candidate]) {
    group.sort_by(|a, b| {
        quality_key(b)
            .cmp(&quality_key(a))
            .then(b.size.cmp(&a.size))
    });
}

fn quality_key(candidate: &Candidate) -> u64 {
    match candidate.bitrate {
        Some(bitrate) => u64::from(bitrate),
        None => candidate.speed,
    }
}

/// No-preference ordering: flac first, then mp3, then everything else,
/// bitrate and size descending within a tier
fn rank_by_format_priority(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        format_priority(&a.extension)
            .cmp(&format_priority(&b.extension))
            .then(b.bitrate.unwrap_or(0).cmp(&a.bitrate.unwrap_or(0)))
            .then(b.size.cmp(&a.size))
    });
    candidates
}

fn format_priority(extension: &str) -> u8 {
    match extension {
        "flac" => 1,
        "mp3" => 2,
        _ => 99,
    }
}
