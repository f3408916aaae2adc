//! Peer-gateway HTTP adapter
//!
//! The gateway daemon owns the single peer network connection and identity.
//! This client establishes one session against it at startup and reuses the
//! same HTTP connection pool for every search and transfer.

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use tunegrab_common::config::Config;
use tunegrab_common::model::{Candidate, RawResult, SearchQuery};

use super::{ByteStream, NetError, PeerNetwork};

const USER_AGENT: &str = concat!("tunegrab/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Session acknowledgment from the gateway
#[derive(Debug, Deserialize)]
struct SessionInfo {
    /// Identity the gateway is logged in under
    username: String,
}

/// HTTP client for the peer-gateway daemon
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    search_timeout_ms: u64,
}

impl GatewayClient {
    /// Establish the gateway session and return a ready client.
    ///
    /// Fails when the gateway is unreachable or rejects the credentials;
    /// callers degrade to an explicit disconnected state rather than
    /// retrying here.
    pub async fn connect(config: &Config) -> Result<Self, NetError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NetError::Http(e.to_string()))?;

        let client = Self {
            http,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            search_timeout_ms: config.search_timeout_ms,
        };

        let session = client.open_session(&config.username, &config.password).await?;
        info!(username = %session.username, "Connected to peer network gateway");

        Ok(client)
    }

    async fn open_session(&self, username: &str, password: &str) -> Result<SessionInfo, NetError> {
        let url = format!("{}/api/session", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|e| NetError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| NetError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PeerNetwork for GatewayClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawResult>, NetError> {
        let url = format!("{}/api/search", self.base_url);
        let search_text = query.search_text();

        debug!(query = %search_text, "Issuing network search");

        let timeout = self.search_timeout_ms.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("query", search_text.as_str()), ("timeout", timeout.as_str())])
            .send()
            .await
            .map_err(|e| NetError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetError::Api(status.as_u16(), body));
        }

        let results: Vec<RawResult> = response
            .json()
            .await
            .map_err(|e| NetError::Decode(e.to_string()))?;

        debug!(count = results.len(), query = %search_text, "Search complete");
        Ok(results)
    }

    async fn open_download_stream(&self, candidate: &Candidate) -> Result<ByteStream, NetError> {
        let url = format!("{}/api/stream", self.base_url);

        debug!(user = %candidate.user, file = %candidate.file, "Opening transfer stream");

        let response = self
            .http
            .get(&url)
            .query(&[("user", candidate.user.as_str()), ("file", candidate.file.as_str())])
            .send()
            .await
            .map_err(|e| NetError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetError::Api(status.as_u16(), body));
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

        Ok(Box::pin(stream))
    }
}
