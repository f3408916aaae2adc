//! Search result and candidate models
//!
//! `RawResult` is whatever the peer gateway reports for one shared file.
//! `Candidate` is the normalized, audio-only view the download engine works
//! with. The audio allow-list lives here so a `Candidate` can only ever be
//! constructed for an allow-listed extension.

use serde::{Deserialize, Serialize};

/// File extensions accepted as downloadable audio (lower-case, no dot)
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "aiff", "wav", "ogg", "aac"];

/// One (artist, title) search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub artist: String,
    pub title: String,
}

impl SearchQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Text sent to the network search, `"{artist} {title}"`
    pub fn search_text(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

/// Unprocessed search result as reported by the peer gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawResult {
    /// Remote file path on the owning peer (may be empty for broken entries)
    #[serde(default)]
    pub file: String,
    /// File size in bytes
    #[serde(default)]
    pub size: u64,
    /// Free upload slots on the owning peer
    #[serde(default)]
    pub slots: u32,
    /// Advertised transfer speed in bytes per second
    #[serde(default)]
    pub speed: u64,
    /// Audio bitrate in kbit/s, when the peer reports one
    #[serde(default)]
    pub bitrate: Option<u32>,
    /// Owning peer identifier
    #[serde(default)]
    pub username: String,
}

/// Normalized, audio-only view of one downloadable file
///
/// Derived deterministically from a `RawResult` and never mutated afterwards.
/// Also the wire representation returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub file: String,
    pub size: u64,
    pub slots: u32,
    pub speed: u64,
    pub bitrate: Option<u32>,
    /// Lower-cased extension without the leading dot, always allow-listed
    pub extension: String,
    pub user: String,
}

impl Candidate {
    /// Normalize a raw result into a candidate.
    ///
    /// Returns `None` for results without a usable file name or with an
    /// extension outside the audio allow-list.
    pub fn from_raw(raw: &RawResult) -> Option<Candidate> {
        let extension = extension_of(&raw.file)?;
        if !is_audio_extension(&extension) {
            return None;
        }

        Some(Candidate {
            file: raw.file.clone(),
            size: raw.size,
            slots: raw.slots,
            speed: raw.speed,
            bitrate: raw.bitrate,
            extension,
            user: if raw.username.is_empty() {
                "Unknown".to_string()
            } else {
                raw.username.clone()
            },
        })
    }
}

/// Extract the lower-cased extension (no dot) from a file path
pub fn extension_of(file: &str) -> Option<String> {
    let name = file.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Whether an extension (lower-case, no dot) is allow-listed audio
pub fn is_audio_extension(extension: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&extension)
}

/// One track of a batch download request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRef {
    /// Opaque track identifier from the playlist source, kept for failure
    /// reporting
    #[serde(default)]
    pub uri: String,
    pub artist: String,
    pub title: String,
}

/// One track acquisition request
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub artist: String,
    pub title: String,
    /// File type to prefer, e.g. "flac"
    pub preferred_extension: Option<String>,
    /// File type to fall back to when nothing preferred is available
    pub fallback_extension: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(file: &str) -> RawResult {
        RawResult {
            file: file.to_string(),
            size: 1000,
            slots: 1,
            speed: 50_000,
            bitrate: Some(320),
            username: "peer1".to_string(),
        }
    }

    #[test]
    fn test_search_text() {
        let query = SearchQuery::new("Boards of Canada", "Roygbiv");
        assert_eq!(query.search_text(), "Boards of Canada Roygbiv");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a\\b\\Song.FLAC"), Some("flac".to_string()));
        assert_eq!(extension_of("music/song.mp3"), Some("mp3".to_string()));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(""), None);
        assert_eq!(extension_of("dir/.hidden"), None);
    }

    #[test]
    fn test_from_raw_normalizes() {
        let candidate = Candidate::from_raw(&raw("Music\\Artist\\Track.Mp3")).unwrap();
        assert_eq!(candidate.extension, "mp3");
        assert_eq!(candidate.user, "peer1");
        assert_eq!(candidate.bitrate, Some(320));
    }

    #[test]
    fn test_from_raw_rejects_non_audio() {
        assert!(Candidate::from_raw(&raw("cover.jpg")).is_none());
        assert!(Candidate::from_raw(&raw("album.zip")).is_none());
        assert!(Candidate::from_raw(&raw("")).is_none());
    }

    #[test]
    fn test_from_raw_defaults_unknown_user() {
        let mut r = raw("track.ogg");
        r.username = String::new();
        assert_eq!(Candidate::from_raw(&r).unwrap().user, "Unknown");
    }

    #[test]
    fn test_candidate_wire_shape() {
        let candidate = Candidate::from_raw(&raw("track.flac")).unwrap();
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["file"], "track.flac");
        assert_eq!(json["extension"], "flac");
        assert_eq!(json["user"], "peer1");
        assert_eq!(json["bitrate"], 320);
    }
}
