//! Server-Sent Events (SSE) progress stream
//!
//! Streams download progress events to connected observers. Each message is
//! one `ProgressEvent` serialized as JSON; the underlying bus subscription
//! is dropped when the observer disconnects.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::state::AppContext;

/// GET /events - SSE progress stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(
        observers = ctx.state.bus.subscriber_count() + 1,
        "New SSE client connected"
    );

    let rx = ctx.state.bus.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event("progress").data(json))),
                Err(e) => {
                    warn!("Failed to serialize progress event: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged receiver; skip and keep the connection alive
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
