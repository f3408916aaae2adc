//! Error types for tunegrab-dl
//!
//! Three layers: `AttemptError` for one candidate transfer (absorbed by the
//! retry loop), `DownloadError` for session-terminal failures, and `ApiError`
//! for the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::net::NetError;

/// Failure of a single candidate transfer attempt
///
/// Never surfaced to callers of the orchestrated download path; the retry
/// loop logs it, reflects it in an error-tagged progress event, and advances
/// to the next candidate.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("failed to open download stream: {0}")]
    StreamOpen(String),

    #[error("download stream error: {0}")]
    Stream(String),

    #[error("file write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("download timed out (no progress)")]
    IdleTimeout,
}

/// Terminal failure of a download operation
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The peer network connection was never established
    #[error("not connected to the peer network")]
    NotConnected,

    /// The network search call itself failed
    #[error("search failed: {0}")]
    SearchFailed(String),

    /// Filtering and ranking produced an empty candidate queue
    #[error("no valid candidates found")]
    NoCandidates,

    /// Every candidate in the ranked queue failed
    #[error("all candidates timed out or failed")]
    AllCandidatesFailed,

    /// A previously chosen source could not be re-matched in a fresh search
    #[error("chosen source not available anymore")]
    SourceUnavailable,

    /// The single attempt of a download-specific request failed
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NetError> for DownloadError {
    fn from(err: NetError) -> Self {
        match err {
            NetError::NotConnected => DownloadError::NotConnected,
            other => DownloadError::SearchFailed(other.to_string()),
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Download engine failure, status derived from the error kind
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Download(DownloadError::NotConnected) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Download(DownloadError::SearchFailed(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Download(DownloadError::NoCandidates)
            | ApiError::Download(DownloadError::SourceUnavailable) => StatusCode::NOT_FOUND,
            ApiError::Download(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
