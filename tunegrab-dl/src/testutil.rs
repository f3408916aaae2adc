//! Test doubles shared by the engine and API tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

use tunegrab_common::config::Config;
use tunegrab_common::events::{ProgressBus, ProgressEvent};
use tunegrab_common::model::{Candidate, RawResult, SearchQuery};

use crate::download::Orchestrator;
use crate::net::{ByteStream, NetError, PeerNetwork};

/// Scripted behavior for one `open_download_stream` call
pub enum StreamScript {
    /// Stream these chunks, then end cleanly
    Chunks(Vec<Vec<u8>>),
    /// Refuse the transfer at open time
    OpenError,
    /// Stream some chunks, then fail mid-transfer
    MidError(Vec<Vec<u8>>),
    /// Never produce a chunk (exercises the idle timeout)
    Stall,
}

/// Peer network double returning fixed search results and scripted streams,
/// consumed in order
pub struct MockNetwork {
    results: Vec<RawResult>,
    scripts: Mutex<VecDeque<StreamScript>>,
    search_fails: bool,
}

impl MockNetwork {
    pub fn new(results: Vec<RawResult>, scripts: Vec<StreamScript>) -> Arc<Self> {
        Arc::new(Self {
            results,
            scripts: Mutex::new(scripts.into()),
            search_fails: false,
        })
    }

    pub fn failing_search() -> Arc<Self> {
        Arc::new(Self {
            results: Vec::new(),
            scripts: Mutex::new(VecDeque::new()),
            search_fails: true,
        })
    }
}

#[async_trait]
impl PeerNetwork for MockNetwork {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<RawResult>, NetError> {
        if self.search_fails {
            return Err(NetError::Http("connection refused".to_string()));
        }
        Ok(self.results.clone())
    }

    async fn open_download_stream(&self, _candidate: &Candidate) -> Result<ByteStream, NetError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StreamScript::OpenError);

        match script {
            StreamScript::OpenError => Err(NetError::Http("peer refused transfer".to_string())),
            StreamScript::Chunks(chunks) => {
                let items = chunks
                    .into_iter()
                    .map(|c| Ok::<Bytes, std::io::Error>(Bytes::from(c)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            StreamScript::MidError(chunks) => {
                let items = chunks
                    .into_iter()
                    .map(|c| Ok::<Bytes, std::io::Error>(Bytes::from(c)))
                    .chain(std::iter::once(Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "peer reset",
                    ))));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            StreamScript::Stall => Ok(Box::pin(futures::stream::pending())),
        }
    }
}

/// Raw audio search result with the given quality attributes
pub fn raw_audio(file: &str, username: &str, bitrate: Option<u32>, size: u64) -> RawResult {
    RawResult {
        file: file.to_string(),
        size,
        slots: 1,
        speed: 100_000,
        bitrate,
        username: username.to_string(),
    }
}

/// Orchestrator wired to a mock network, a fresh bus, and a temp download dir
pub fn test_orchestrator(
    network: Arc<dyn PeerNetwork>,
    download_dir: &Path,
    idle_timeout_secs: u64,
) -> (Orchestrator, ProgressBus) {
    let bus = ProgressBus::new(64);
    let config = Config {
        download_dir: download_dir.to_path_buf(),
        idle_timeout_secs,
        ..Config::default()
    };
    (Orchestrator::new(network, bus.clone(), &config), bus)
}

/// Collect everything currently buffered on a subscription
pub fn drain(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
