//! Push hub
//!
//! Owns the session store, the event bus and the connection registry for
//! the WebSocket front end. Socket tasks call [`PushHub::connect`],
//! [`PushHub::dispatch`] and [`PushHub::disconnect`]; everything they must
//! write back to clients arrives through the bus.
//!
//! Lock order is always session, then registry. Broadcasts are emitted
//! while the relevant lock is held, so clients observe events in mutation
//! order.

use livepoll_common::events::{ClientEvent, EventBus, ServerEvent};
use livepoll_common::{SharedSession, VoteOutcome};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::registry::{ConnectionId, ConnectionRegistry};

/// A freshly accepted connection
pub struct Connection {
    pub id: ConnectionId,
    /// Every broadcast emitted after registration
    pub events: broadcast::Receiver<ServerEvent>,
    /// Sent to this connection alone, before any broadcast
    pub greeting: Option<ServerEvent>,
}

pub struct PushHub {
    session: SharedSession,
    bus: EventBus,
    connections: Mutex<ConnectionRegistry>,
}

impl PushHub {
    pub fn new(event_capacity: usize) -> Self {
        Self::with_session(SharedSession::default(), event_capacity)
    }

    pub fn with_session(session: SharedSession, event_capacity: usize) -> Self {
        Self {
            session,
            bus: EventBus::new(event_capacity),
            connections: Mutex::new(ConnectionRegistry::new()),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Register a new client and broadcast the updated count
    ///
    /// If voting is open, the greeting carries the current question so the
    /// client can vote immediately.
    pub async fn connect(&self) -> Connection {
        let store = self.session.lock().await;
        let mut connections = self.connections.lock().await;

        // Subscribe first so the new client also sees its own count
        let events = self.bus.subscribe();
        let id = ConnectionId::new();
        let count = connections.register(id);
        self.bus.emit_lossy(ServerEvent::ConnectedCount(count as u64));
        info!("Client {} connected ({} connected)", id, count);

        let greeting = if store.is_voting_open() {
            store
                .question()
                .map(|question| ServerEvent::NewQuestion(question.to_string()))
        } else {
            None
        };

        Connection {
            id,
            events,
            greeting,
        }
    }

    /// Unregister a client and broadcast the updated count
    pub async fn disconnect(&self, id: ConnectionId) {
        let mut connections = self.connections.lock().await;
        let count = connections.unregister(id);
        self.bus.emit_lossy(ServerEvent::ConnectedCount(count as u64));
        info!("Client {} disconnected ({} connected)", id, count);
    }

    /// Apply one client event; returns the event broadcast, if any
    ///
    /// Rejected votes broadcast nothing and send nothing back to the voter.
    pub async fn dispatch(&self, from: ConnectionId, event: ClientEvent) -> Option<ServerEvent> {
        let mut store = self.session.lock().await;
        let before = store.phase();
        debug!("Client {} sent {}", from, event.name());

        let outgoing = match event {
            ClientEvent::AskQuestion(question) => {
                store.pose_question(question.clone());
                Some(ServerEvent::NewQuestion(question))
            }
            ClientEvent::Vote(color) => {
                let connections = self.connections.lock().await;
                let voter = connections
                    .voter_id(from)
                    .map(|voter| voter.as_str())
                    .unwrap_or_default();

                match store.cast_vote(&color, voter) {
                    VoteOutcome::Accepted(tally) => Some(ServerEvent::VoteUpdate(tally)),
                    outcome => {
                        debug!("Vote from {} ignored: {:?}", from, outcome);
                        None
                    }
                }
            }
            ClientEvent::ShowResults => Some(ServerEvent::Results(store.close_voting())),
            ClientEvent::Reset => {
                store.reset_voting();
                Some(ServerEvent::Reset)
            }
            ClientEvent::EndSession => {
                store.end_session();
                Some(ServerEvent::SessionEnded)
            }
        };

        store.note_transition(before);
        if let Some(event) = &outgoing {
            self.bus.emit_lossy(event.clone());
        }
        outgoing
    }

    pub async fn connected_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
