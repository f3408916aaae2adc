//! # Tunegrab Download Daemon (tunegrab-dl)
//!
//! Locates audio files on a peer-to-peer sharing network, downloads the best
//! available source with retry across alternatives, and streams progress to
//! observers.
//!
//! **Purpose:** Search the network for (artist, title), filter and rank the
//! results by quality policy, drive transfer attempts under an idle timeout,
//! and provide the HTTP/SSE control interface.

pub mod api;
pub mod download;
pub mod error;
pub mod net;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{ApiError, AttemptError, DownloadError};
pub use state::AppContext;
