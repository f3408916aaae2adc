//! Shared server state
//!
//! Thread-safe state shared between HTTP handlers and the background batch
//! task: the progress bus, the failure tracker for the most recent batch,
//! and the per-playlist registry of completed file paths (consumed later by
//! the separate file-organization tooling).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tunegrab_common::events::ProgressBus;

use crate::download::Orchestrator;

/// Completed downloads recorded for one playlist
#[derive(Debug, Clone, Default)]
pub struct PlaylistEntry {
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// State shared by all handlers
pub struct SharedState {
    /// Progress event broadcaster for SSE observers
    pub bus: ProgressBus,

    /// Track URIs that failed in the most recent batch
    failed_downloads: RwLock<Vec<String>>,

    /// Completed file paths keyed by playlist id
    playlist_files: RwLock<HashMap<String, PlaylistEntry>>,
}

impl SharedState {
    pub fn new(bus: ProgressBus) -> Self {
        Self {
            bus,
            failed_downloads: RwLock::new(Vec::new()),
            playlist_files: RwLock::new(HashMap::new()),
        }
    }

    /// Clear the failure tracker at the start of a new batch
    pub async fn reset_failures(&self) {
        self.failed_downloads.write().await.clear();
    }

    /// Record one failed track URI
    pub async fn record_failure(&self, uri: String) {
        if !uri.is_empty() {
            self.failed_downloads.write().await.push(uri);
        }
    }

    /// Failed track URIs of the most recent batch
    pub async fn failed_downloads(&self) -> Vec<String> {
        self.failed_downloads.read().await.clone()
    }

    /// Make sure a playlist registry entry exists
    pub async fn ensure_playlist(&self, playlist_id: &str, name: Option<&str>) {
        let mut registry = self.playlist_files.write().await;
        registry
            .entry(playlist_id.to_string())
            .or_insert_with(|| PlaylistEntry {
                name: name.unwrap_or(playlist_id).to_string(),
                files: Vec::new(),
            });
    }

    /// Record a completed file for a playlist
    pub async fn record_file(&self, playlist_id: &str, path: PathBuf) {
        let mut registry = self.playlist_files.write().await;
        registry
            .entry(playlist_id.to_string())
            .or_insert_with(|| PlaylistEntry {
                name: playlist_id.to_string(),
                files: Vec::new(),
            })
            .files
            .push(path);
    }

    /// Snapshot of one playlist's completed files
    pub async fn playlist(&self, playlist_id: &str) -> Option<PlaylistEntry> {
        self.playlist_files.read().await.get(playlist_id).cloned()
    }
}

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub orchestrator: Arc<Orchestrator>,
    /// Whether the gateway session was established at startup
    pub connected: bool,
    pub port: u16,
}
