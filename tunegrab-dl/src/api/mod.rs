//! HTTP API for the download daemon
//!
//! Routes follow the operator UI contract: a candidate search, the two
//! download entry points, the batch failure tracker, and the SSE progress
//! stream.

pub mod handlers;
pub mod sse;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::state::AppContext;

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/search-options", get(handlers::search_options))
        .route("/download", post(handlers::download_batch))
        .route("/download-specific", post(handlers::download_specific))
        .route("/tracker", get(handlers::tracker))
        // SSE event stream
        .route("/events", get(sse::event_stream))
        .with_state(ctx)
        // Enable CORS for local UI access
        .layer(CorsLayer::permissive())
}
