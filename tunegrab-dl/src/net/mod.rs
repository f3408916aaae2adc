//! Peer network seam
//!
//! The sharing network's wire protocol is out of scope for this daemon. A
//! local peer-gateway process owns the actual connection and identity; this
//! module defines the trait the download engine talks through plus the
//! reqwest-backed adapter to that gateway.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tunegrab_common::model::{Candidate, RawResult, SearchQuery};

pub mod gateway;

pub use gateway::GatewayClient;

/// Byte stream of one remote file transfer
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Peer network adapter errors
#[derive(Debug, Error)]
pub enum NetError {
    /// The gateway session was never established
    #[error("not connected to the peer network")]
    NotConnected,

    /// Transport-level request failure
    #[error("gateway request failed: {0}")]
    Http(String),

    /// The gateway answered with a non-success status
    #[error("gateway error {0}: {1}")]
    Api(u16, String),

    /// The gateway answered with a body we could not parse
    #[error("malformed gateway response: {0}")]
    Decode(String),
}

/// Access to the peer-to-peer sharing network
///
/// One implementation exists per process; the orchestrator holds it behind
/// an `Arc` and reuses it for every search and transfer.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Issue a network-wide file search and collect the responses
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawResult>, NetError>;

    /// Open the byte stream for one candidate's remote file
    async fn open_download_stream(&self, candidate: &Candidate) -> Result<ByteStream, NetError>;
}

/// Stand-in used when the gateway session could not be established at
/// startup. Every operation fails fast with `NotConnected` instead of
/// hanging, so the HTTP surface stays responsive.
pub struct Disconnected;

#[async_trait]
impl PeerNetwork for Disconnected {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<RawResult>, NetError> {
        Err(NetError::NotConnected)
    }

    async fn open_download_stream(&self, _candidate: &Candidate) -> Result<ByteStream, NetError> {
        Err(NetError::NotConnected)
    }
}
