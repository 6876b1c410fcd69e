//! Connection registry
//!
//! Maps each live socket to the voter identity used for duplicate-vote
//! suppression. The identity is fixed when the connection is registered.

use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Handle for one accepted WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity a connection votes under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoterId(String);

impl VoterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ConnectionId> for VoterId {
    fn from(id: ConnectionId) -> Self {
        Self(id.to_string())
    }
}

/// Currently connected clients
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    voters: HashMap<ConnectionId, VoterId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, deriving its voter id; returns the new count
    pub fn register(&mut self, id: ConnectionId) -> usize {
        self.voters.entry(id).or_insert_with(|| VoterId::from(id));
        self.voters.len()
    }

    /// Remove a connection; returns the new count
    pub fn unregister(&mut self, id: ConnectionId) -> usize {
        self.voters.remove(&id);
        self.voters.len()
    }

    pub fn voter_id(&self, id: ConnectionId) -> Option<&VoterId> {
        self.voters.get(&id)
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}
