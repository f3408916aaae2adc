//! Progress event types and the ProgressBus
//!
//! Download sessions publish `ProgressEvent`s through a process-wide
//! `ProgressBus`; the SSE endpoint fans them out to connected observers.
//! The bus does not buffer history: subscribers only see events emitted
//! after they subscribed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// One download lifecycle update
///
/// Many are emitted per session (0..n transfer updates plus attempt
/// failures); the final event for a session either has `done: true` (success)
/// or carries the session-level error. Fields that are `None` are omitted
/// from the serialized JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Generated per download session; disambiguates concurrent sessions
    /// that share the same (artist, title)
    pub session_id: Uuid,
    pub artist: String,
    pub title: String,
    /// Percent complete, when the total size is known. Non-decreasing within
    /// a session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Instantaneous throughput in MB/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// True only on the single success event of a session
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Local save path, once a transfer target exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Upper-cased extension of the completed file, e.g. "FLAC"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Base event for a session; callers fill in the update-specific fields
    /// with struct update syntax.
    pub fn new(session_id: Uuid, artist: &str, title: &str) -> Self {
        Self {
            session_id,
            artist: artist.to_string(),
            title: title.to_string(),
            percent: None,
            speed: None,
            downloaded_bytes: None,
            file_size: None,
            done: false,
            error: None,
            path: None,
            file_type: None,
            bitrate: None,
            timestamp: Utc::now(),
        }
    }

    /// Whether this is the last event a session will publish
    pub fn is_terminal(&self) -> bool {
        self.done || self.error.is_some()
    }
}

/// Process-wide broadcast channel for download progress
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers never block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
///
/// There is no replay: events published before a subscription are never
/// delivered to it.
#[derive(Clone)]
pub struct ProgressBus {
    tx: broadcast::Sender<ProgressEvent>,
    capacity: usize,
}

impl ProgressBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ProgressEvent,
    ) -> Result<usize, broadcast::error::SendError<ProgressEvent>> {
        self.tx.send(event)
    }

    /// Publish an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ProgressEvent {
        ProgressEvent::new(Uuid::new_v4(), "Artist", "Title")
    }

    #[test]
    fn test_bus_new() {
        let bus = ProgressBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_bus_subscribe() {
        let bus = ProgressBus::new(10);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_emit_no_subscribers() {
        let bus = ProgressBus::new(10);
        assert!(bus.emit(event()).is_err());
        // Lossy emit must not panic without subscribers
        bus.emit_lossy(event());
    }

    #[test]
    fn test_multiple_subscribers_receive_same_event() {
        let bus = ProgressBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let sent = event();
        bus.emit(sent.clone()).expect("emit should succeed");

        let r1 = rx1.try_recv().expect("rx1 should receive");
        let r2 = rx2.try_recv().expect("rx2 should receive");
        assert_eq!(r1.session_id, sent.session_id);
        assert_eq!(r2.session_id, sent.session_id);
    }

    #[test]
    fn test_emit_lossy_on_full_channel() {
        let bus = ProgressBus::new(2);
        let _rx = bus.subscribe(); // subscribed but never reading

        for _ in 0..10 {
            bus.emit_lossy(event()); // must not panic when full
        }
    }

    #[test]
    fn test_none_fields_omitted_from_json() {
        let json = serde_json::to_value(event()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(obj.contains_key("sessionId"));
        assert!(obj.contains_key("artist"));
        assert!(obj.contains_key("title"));
        assert!(obj.contains_key("timestamp"));
        assert_eq!(json["done"], false);
        assert!(!obj.contains_key("percent"));
        assert!(!obj.contains_key("error"));
        assert!(!obj.contains_key("path"));
        assert!(!obj.contains_key("fileType"));
    }

    #[test]
    fn test_transfer_update_json_shape() {
        let update = ProgressEvent {
            percent: Some(42.5),
            speed: Some(1.25),
            downloaded_bytes: Some(425_000),
            file_size: Some(1_000_000),
            path: Some("/tmp/A - B.mp3".to_string()),
            ..event()
        };
        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json["percent"], 42.5);
        assert_eq!(json["speed"], 1.25);
        assert_eq!(json["downloadedBytes"], 425_000);
        assert_eq!(json["fileSize"], 1_000_000);
        assert_eq!(json["done"], false);
    }

    #[test]
    fn test_is_terminal() {
        assert!(!event().is_terminal());

        let done = ProgressEvent {
            done: true,
            percent: Some(100.0),
            ..event()
        };
        assert!(done.is_terminal());

        let failed = ProgressEvent {
            error: Some("download timed out (no progress)".to_string()),
            ..event()
        };
        assert!(failed.is_terminal());
    }
}
