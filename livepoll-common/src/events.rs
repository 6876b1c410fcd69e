//! Event types for the push channel
//!
//! Provides the event vocabulary shared by presenter and audience clients and
//! the EventBus used to fan server events out to every connection.
//!
//! Wire frame: one JSON text message per event,
//! `{"event": "<name>", "data": <payload>}`. Payload-less events omit `data`.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::Tally;

/// Default number of events buffered per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Server → client events
///
/// Every variant except the connect-time `NewQuestion` is broadcast to all
/// connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Number of clients currently connected
    ConnectedCount(u64),
    /// Presenter posed a question; voting is open
    NewQuestion(String),
    /// A vote was accepted
    VoteUpdate(Tally),
    /// Voting closed; final tally
    Results(Tally),
    /// Question and votes cleared
    Reset,
    /// Presenter ended the session
    SessionEnded,
}

impl ServerEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ConnectedCount(_) => "connected-count",
            ServerEvent::NewQuestion(_) => "new-question",
            ServerEvent::VoteUpdate(_) => "vote-update",
            ServerEvent::Results(_) => "results",
            ServerEvent::Reset => "reset",
            ServerEvent::SessionEnded => "session-ended",
        }
    }

    /// Encode as a JSON text frame
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Client → server events
///
/// `AskQuestion`, `ShowResults`, `Reset` and `EndSession` come from the
/// presenter view; `Vote` from audience members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    AskQuestion(String),
    /// Raw color string; validated by the session store
    Vote(String),
    ShowResults,
    Reset,
    EndSession,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::AskQuestion(_) => "ask-question",
            ClientEvent::Vote(_) => "vote",
            ClientEvent::ShowResults => "show-results",
            ClientEvent::Reset => "reset",
            ClientEvent::EndSession => "end-session",
        }
    }

    /// Decode a JSON text frame
    pub fn from_frame(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}

/// Broadcast channel for [`ServerEvent`]s
///
/// Each connection holds its own receiver. Events emitted before a
/// subscription are not delivered to it.
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use livepoll_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(64);
    /// assert_eq!(event_bus.capacity(), 64);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ServerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_event_frames() {
        let frame = ServerEvent::ConnectedCount(3).to_frame().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({ "event": "connected-count", "data": 3 }));

        let value = serde_json::to_value(ServerEvent::VoteUpdate(Tally { red: 2, green: 5 })).unwrap();
        assert_eq!(value, json!({ "event": "vote-update", "data": { "red": 2, "green": 5 } }));

        let value = serde_json::to_value(ServerEvent::SessionEnded).unwrap();
        assert_eq!(value, json!({ "event": "session-ended" }));
    }

    #[test]
    fn test_client_event_parsing() {
        assert_eq!(
            ClientEvent::from_frame(r#"{"event":"ask-question","data":"Like it?"}"#).unwrap(),
            ClientEvent::AskQuestion("Like it?".to_string())
        );
        assert_eq!(
            ClientEvent::from_frame(r#"{"event":"vote","data":"green"}"#).unwrap(),
            ClientEvent::Vote("green".to_string())
        );
        assert_eq!(
            ClientEvent::from_frame(r#"{"event":"show-results"}"#).unwrap(),
            ClientEvent::ShowResults
        );
        assert_eq!(
            ClientEvent::from_frame(r#"{"event":"end-session"}"#).unwrap(),
            ClientEvent::EndSession
        );
    }

    #[test]
    fn test_client_event_rejects_unknown() {
        assert!(ClientEvent::from_frame(r#"{"event":"launch"}"#).is_err());
        assert!(ClientEvent::from_frame("not json").is_err());
        assert!(ClientEvent::from_frame(r#"{"event":"vote"}"#).is_err());
    }

    #[test]
    fn test_event_names_match_wire() {
        let events = [
            ServerEvent::ConnectedCount(1),
            ServerEvent::NewQuestion("q".to_string()),
            ServerEvent::VoteUpdate(Tally::default()),
            ServerEvent::Results(Tally::default()),
            ServerEvent::Reset,
            ServerEvent::SessionEnded,
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event.name());
        }
    }

    #[tokio::test]
    async fn test_bus_delivers_to_all_subscribers() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit_lossy(ServerEvent::Reset);
        assert_eq!(a.recv().await.unwrap(), ServerEvent::Reset);
        assert_eq!(b.recv().await.unwrap(), ServerEvent::Reset);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::default();
        bus.emit_lossy(ServerEvent::Reset);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), DEFAULT_EVENT_CAPACITY);
    }
}
