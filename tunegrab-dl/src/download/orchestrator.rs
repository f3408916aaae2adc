//! Download orchestration
//!
//! One acquisition runs search, filter, rank, then sequential transfer
//! attempts over the ranked queue until a candidate completes or the queue
//! is exhausted. Attempts never run concurrently: the underlying peer
//! connection is shared, so a single transfer permit serializes them across
//! every entry point. Each attempt streams chunks under an idle timeout that
//! measures inactivity and is re-armed by every received chunk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tunegrab_common::config::Config;
use tunegrab_common::events::{ProgressBus, ProgressEvent};
use tunegrab_common::model::{Candidate, DownloadRequest, SearchQuery};

use crate::download::filter::{self, SearchMode};
use crate::download::rank::{self, FormatPreference};
use crate::download::{fname, matcher};
use crate::error::{AttemptError, DownloadError};
use crate::net::PeerNetwork;

/// Result of a successful acquisition
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub path: PathBuf,
}

/// Transient identity of one in-flight acquisition. The generated id ties
/// all progress events of the session together for observers.
struct Session {
    id: Uuid,
    artist: String,
    title: String,
}

impl Session {
    fn new(artist: &str, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }

    /// Base progress event for this session
    fn event(&self) -> ProgressEvent {
        ProgressEvent::new(self.id, &self.artist, &self.title)
    }
}

/// Top-level download engine
pub struct Orchestrator {
    network: Arc<dyn PeerNetwork>,
    bus: ProgressBus,
    download_dir: PathBuf,
    idle_timeout: Duration,
    /// The shared peer connection is not safe for concurrent transfers
    transfer_permit: Mutex<()>,
}

impl Orchestrator {
    pub fn new(network: Arc<dyn PeerNetwork>, bus: ProgressBus, config: &Config) -> Self {
        Self {
            network,
            bus,
            download_dir: config.download_dir.clone(),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            transfer_permit: Mutex::new(()),
        }
    }

    /// Search the network and return ranked candidates for display.
    ///
    /// Preview mode: busy peers stay listed, nothing is downloaded.
    pub async fn search_preview(
        &self,
        query: &SearchQuery,
        prefs: &FormatPreference,
    ) -> Result<Vec<Candidate>, DownloadError> {
        let results = self.network.search(query).await?;
        let candidates = filter::filter_results(&results, &query.title, SearchMode::Preview);
        Ok(rank::rank(candidates, prefs))
    }

    /// Acquire one track: search, rank, then try candidates in order until
    /// one completes.
    pub async fn download(&self, request: DownloadRequest) -> Result<Downloaded, DownloadError> {
        let session = Session::new(&request.artist, &request.title);
        let query = SearchQuery::new(request.artist.clone(), request.title.clone());

        debug!(session = %session.id, query = %query.search_text(), "Starting download");

        let results = self.network.search(&query).await?;
        info!(
            count = results.len(),
            query = %query.search_text(),
            "Search returned results"
        );

        let candidates = filter::filter_results(&results, &request.title, SearchMode::Transfer);
        let prefs = FormatPreference::new(
            request.preferred_extension.as_deref(),
            request.fallback_extension.as_deref(),
        );
        let queue = rank::rank(candidates, &prefs);

        if queue.is_empty() {
            return Err(self.fail_session(&session, DownloadError::NoCandidates));
        }

        match (&prefs.preferred, &prefs.fallback) {
            (Some(p), _) if queue[0].extension == *p => {
                info!(format = %p, "Using preferred file type");
            }
            (_, Some(f)) if queue[0].extension == *f => {
                info!(format = %f, "Preferred type unavailable, falling back");
            }
            (Some(_), _) | (_, Some(_)) => {
                info!("No preferred or fallback types found, using best available audio");
            }
            _ => {}
        }

        let total = queue.len();
        info!(
            candidates = total,
            artist = %request.artist,
            title = %request.title,
            "Trying candidate files"
        );

        for (index, candidate) in queue.iter().enumerate() {
            info!(
                attempt = index + 1,
                total,
                file = %candidate.file,
                bitrate = ?candidate.bitrate,
                speed = candidate.speed,
                "Attempting transfer"
            );

            match self.attempt(&session, candidate).await {
                Ok(path) => return Ok(Downloaded { path }),
                Err(err) => {
                    warn!(attempt = index + 1, error = %err, "Candidate failed");
                    self.bus.emit_lossy(ProgressEvent {
                        error: Some(err.to_string()),
                        ..session.event()
                    });
                }
            }
        }

        Err(self.fail_session(&session, DownloadError::AllCandidatesFailed))
    }

    /// Acquire one specific source chosen earlier by the caller.
    ///
    /// The candidate is re-located in a fresh search first; the network
    /// snapshot may have changed since the caller picked it. Deliberately a
    /// single attempt with no retry queue: silently downloading some other
    /// source would contradict the explicit choice.
    pub async fn download_specific(
        &self,
        wanted: &Candidate,
        artist: &str,
        title: &str,
    ) -> Result<Downloaded, DownloadError> {
        let session = Session::new(artist, title);
        let query = SearchQuery::new(artist, title);

        let results = self.network.search(&query).await?;
        if results.is_empty() {
            return Err(self.fail_session(&session, DownloadError::SourceUnavailable));
        }

        let Some(candidate) = matcher::rematch(wanted, &results) else {
            return Err(self.fail_session(&session, DownloadError::SourceUnavailable));
        };

        info!(
            file = %candidate.file,
            user = %candidate.user,
            "Re-matched chosen source, starting transfer"
        );

        match self.attempt(&session, &candidate).await {
            Ok(path) => Ok(Downloaded { path }),
            Err(err) => {
                warn!(error = %err, file = %candidate.file, "Specific transfer failed");
                self.bus.emit_lossy(ProgressEvent {
                    error: Some(err.to_string()),
                    ..session.event()
                });
                Err(DownloadError::TransferFailed(err.to_string()))
            }
        }
    }

    /// Publish the terminal error event for a failed session
    fn fail_session(&self, session: &Session, error: DownloadError) -> DownloadError {
        self.bus.emit_lossy(ProgressEvent {
            error: Some(error.to_string()),
            ..session.event()
        });
        error
    }

    /// Run one transfer attempt to completion.
    ///
    /// Holds the transfer permit for the whole attempt. Publishes one
    /// progress event per received chunk and the session's terminal
    /// `done: true` event on success.
    async fn attempt(&self, session: &Session, candidate: &Candidate) -> Result<PathBuf, AttemptError> {
        let _permit = self.transfer_permit.lock().await;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let filename = fname::safe_filename(&session.artist, &session.title, &candidate.extension);
        let save_path = self.download_dir.join(filename);

        let mut stream = self
            .network
            .open_download_stream(candidate)
            .await
            .map_err(|e| AttemptError::StreamOpen(e.to_string()))?;

        let mut file = tokio::fs::File::create(&save_path).await?;

        let file_size = (candidate.size > 0).then_some(candidate.size);
        let mut downloaded: u64 = 0;
        let started = Instant::now();

        loop {
            // The timer measures inactivity, not total duration; every
            // received chunk re-arms it
            let chunk = match tokio::time::timeout(self.idle_timeout, stream.next()).await {
                Err(_) => return Err(AttemptError::IdleTimeout),
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(AttemptError::Stream(e.to_string())),
                Ok(Some(Ok(chunk))) => chunk,
            };

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            let elapsed = started.elapsed().as_secs_f64();
            let speed = if elapsed > 0.0 {
                downloaded as f64 / 1024.0 / 1024.0 / elapsed
            } else {
                0.0
            };
            let percent = file_size
                .map(|size| ((downloaded as f64 * 1000.0 / size as f64).round() / 10.0).min(100.0));

            self.bus.emit_lossy(ProgressEvent {
                percent,
                speed: Some(speed),
                downloaded_bytes: Some(downloaded),
                file_size,
                path: Some(save_path.display().to_string()),
                ..session.event()
            });
        }

        file.flush().await?;

        self.bus.emit_lossy(ProgressEvent {
            percent: Some(100.0),
            speed: Some(0.0),
            downloaded_bytes: Some(file_size.unwrap_or(downloaded)),
            file_size,
            done: true,
            path: Some(save_path.display().to_string()),
            file_type: Some(candidate.extension.to_uppercase()),
            bitrate: candidate.bitrate,
            ..session.event()
        });

        info!(
            artist = %session.artist,
            title = %session.title,
            path = %save_path.display(),
            "Download complete"
        );

        Ok(save_path)
    }
}
