//! HTTP request handlers
//!
//! Request bodies use the operator UI's wire contract (`fileInfo`,
//! `fileTypePreference`, ...), hence the camelCase renames.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tunegrab_common::model::{Candidate, DownloadRequest, SearchQuery, TrackRef};

use crate::download::rank::FormatPreference;
use crate::error::{ApiError, ApiResult};
use crate::state::AppContext;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchOptionsQuery {
    artist: Option<String>,
    title: Option<String>,
    preferred: Option<String>,
    fallback: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSpecificRequest {
    file_info: Candidate,
    artist: String,
    title: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadSpecificResponse {
    success: bool,
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadRequest {
    tracks: Vec<TrackRef>,
    #[serde(default)]
    file_type_preference: Option<String>,
    #[serde(default)]
    fallback_file_type_preference: Option<String>,
    #[serde(default)]
    playlist_id: Option<String>,
    #[serde(default)]
    playlist_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchAcceptedResponse {
    message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    port: u16,
    connected: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "tunegrab-dl".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: ctx.port,
        connected: ctx.connected,
    })
}

/// GET /search-options - List ranked download sources for one track
pub async fn search_options(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchOptionsQuery>,
) -> ApiResult<Json<Vec<Candidate>>> {
    let artist = params.artist.filter(|s| !s.trim().is_empty());
    let title = params.title.filter(|s| !s.trim().is_empty());

    let (Some(artist), Some(title)) = (artist, title) else {
        return Err(ApiError::BadRequest("artist and title required".to_string()));
    };

    let prefs = FormatPreference::new(params.preferred.as_deref(), params.fallback.as_deref());
    let candidates = ctx
        .orchestrator
        .search_preview(&SearchQuery::new(artist, title), &prefs)
        .await?;

    Ok(Json(candidates))
}

/// POST /download-specific - Download one source the user picked explicitly
pub async fn download_specific(
    State(ctx): State<AppContext>,
    Json(req): Json<DownloadSpecificRequest>,
) -> ApiResult<Json<DownloadSpecificResponse>> {
    if req.artist.trim().is_empty() || req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("artist and title required".to_string()));
    }

    let downloaded = ctx
        .orchestrator
        .download_specific(&req.file_info, &req.artist, &req.title)
        .await?;

    Ok(Json(DownloadSpecificResponse {
        success: true,
        path: downloaded.path.display().to_string(),
    }))
}

/// POST /download - Batch download through the full retry pipeline
///
/// Acknowledges immediately; the tracks are processed sequentially in a
/// background task. Per-track failures accumulate in the tracker instead of
/// aborting the batch.
pub async fn download_batch(
    State(ctx): State<AppContext>,
    Json(req): Json<BatchDownloadRequest>,
) -> ApiResult<Json<BatchAcceptedResponse>> {
    if req.tracks.is_empty() {
        return Err(ApiError::BadRequest("tracks required".to_string()));
    }

    ctx.state.reset_failures().await;
    if let Some(playlist_id) = &req.playlist_id {
        ctx.state
            .ensure_playlist(playlist_id, req.playlist_name.as_deref())
            .await;
    }

    let message = format!("Downloading {} tracks...", req.tracks.len());
    info!(tracks = req.tracks.len(), playlist = ?req.playlist_id, "Batch download accepted");

    tokio::spawn(run_batch(ctx.clone(), req));

    Ok(Json(BatchAcceptedResponse { message }))
}

/// GET /tracker - Track URIs that failed in the most recent batch
pub async fn tracker(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    Json(ctx.state.failed_downloads().await)
}

/// Sequential batch worker
async fn run_batch(ctx: AppContext, req: BatchDownloadRequest) {
    let total = req.tracks.len();
    let mut successes = 0;

    for (index, track) in req.tracks.into_iter().enumerate() {
        let TrackRef { uri, artist, title } = track;

        info!(
            current = index + 1,
            total,
            artist = %artist,
            title = %title,
            "Downloading batch track"
        );

        let request = DownloadRequest {
            artist,
            title,
            preferred_extension: req.file_type_preference.clone(),
            fallback_extension: req.fallback_file_type_preference.clone(),
        };

        match ctx.orchestrator.download(request).await {
            Ok(downloaded) => {
                successes += 1;
                if let Some(playlist_id) = &req.playlist_id {
                    ctx.state.record_file(playlist_id, downloaded.path).await;
                }
            }
            Err(err) => {
                warn!(error = %err, uri = %uri, "Batch track failed");
                ctx.state.record_failure(uri).await;
            }
        }
    }

    info!(successes, total, "Batch complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use crate::state::SharedState;
    use crate::testutil::{raw_audio, test_orchestrator, MockNetwork, StreamScript};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_ctx(network: Arc<MockNetwork>, dir: &Path) -> AppContext {
        let (orchestrator, bus) = test_orchestrator(network, dir, 90);
        AppContext {
            state: Arc::new(SharedState::new(bus)),
            orchestrator: Arc::new(orchestrator),
            connected: true,
            port: 0,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_options_requires_artist_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_ctx(MockNetwork::new(vec![], vec![]), dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search-options?artist=A")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid request: artist and title required");
    }

    #[tokio::test]
    async fn test_search_options_returns_bare_ranked_array() {
        let dir = tempfile::tempdir().unwrap();
        let network = MockNetwork::new(
            vec![
                raw_audio("x/B.mp3", "p1", Some(320), 100),
                raw_audio("y/B.flac", "p2", Some(900), 100),
                raw_audio("z/cover.jpg", "p3", None, 100),
            ],
            vec![],
        );
        let app = create_router(test_ctx(network, dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search-options?artist=A&title=B")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let list = json.as_array().expect("response is a bare array");
        assert_eq!(list.len(), 2);
        // Fixed format priority puts flac first
        assert_eq!(list[0]["extension"], "flac");
    }

    #[tokio::test]
    async fn test_download_specific_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let network = MockNetwork::new(
            vec![raw_audio("music/Night.flac", "p1", Some(900), 4)],
            vec![StreamScript::Chunks(vec![b"flac".to_vec()])],
        );
        let app = create_router(test_ctx(network, dir.path()));

        let body = serde_json::json!({
            "fileInfo": {
                "file": "music/Night.flac",
                "size": 4,
                "slots": 1,
                "speed": 100000,
                "bitrate": 900,
                "extension": "flac",
                "user": "p1",
            },
            "artist": "A",
            "title": "Night",
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/download-specific")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["path"].as_str().unwrap().ends_with("A - Night.flac"));
    }

    #[tokio::test]
    async fn test_download_batch_acknowledges_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_ctx(MockNetwork::new(vec![], vec![]), dir.path()));

        let body = serde_json::json!({
            "tracks": [
                { "uri": "spotify:track:1", "artist": "A", "title": "B" },
                { "uri": "spotify:track:2", "artist": "C", "title": "D" },
            ],
            "fileTypePreference": "flac",
            "fallbackFileTypePreference": "mp3",
            "playlistId": "pl1",
            "playlistName": "Road Trip",
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/download")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Downloading 2 tracks...");
    }

    #[tokio::test]
    async fn test_run_batch_accumulates_failures_and_files() {
        let dir = tempfile::tempdir().unwrap();
        // One shared result set; the first track's transfer succeeds, the
        // second fails at stream open and exhausts its queue
        let network = MockNetwork::new(
            vec![raw_audio("x/B.mp3", "p1", Some(320), 5)],
            vec![
                StreamScript::Chunks(vec![b"audio".to_vec()]),
                StreamScript::OpenError,
            ],
        );
        let ctx = test_ctx(network, dir.path());
        ctx.state.ensure_playlist("pl1", Some("Road Trip")).await;

        let req = BatchDownloadRequest {
            tracks: vec![
                TrackRef {
                    uri: "uri-1".to_string(),
                    artist: "A".to_string(),
                    title: "B".to_string(),
                },
                TrackRef {
                    uri: "uri-2".to_string(),
                    artist: "A".to_string(),
                    title: "B".to_string(),
                },
            ],
            file_type_preference: None,
            fallback_file_type_preference: None,
            playlist_id: Some("pl1".to_string()),
            playlist_name: Some("Road Trip".to_string()),
        };

        run_batch(ctx.clone(), req).await;

        assert_eq!(ctx.state.failed_downloads().await, vec!["uri-2"]);
        let playlist = ctx.state.playlist("pl1").await.unwrap();
        assert_eq!(playlist.files.len(), 1);
        assert!(playlist.files[0].ends_with("A - B.mp3"));
    }

    #[tokio::test]
    async fn test_tracker_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_ctx(MockNetwork::new(vec![], vec![]), dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/tracker").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_ctx(MockNetwork::new(vec![], vec![]), dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["module"], "tunegrab-dl");
        assert_eq!(json["connected"], true);
    }
}
