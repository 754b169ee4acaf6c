//! Connection presence tracking.
//!
//! Maps each live connection to the room it currently occupies. A connection
//! is a member of at most one room; joining another room implies leaving the
//! previous one first (enforced by the gateway). Membership sets themselves
//! live inside the room session actors; this map only answers "where is this
//! connection", so commands can be routed and implicit leaves resolved.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, RoomId, UserId};

/// What is known about one connection once it has joined a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub username: String,
}

#[derive(Default)]
pub struct PresenceTracker {
    connections: Mutex<HashMap<ConnectionId, Presence>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where a connection now lives, replacing any previous entry.
    pub async fn record(&self, connection: ConnectionId, presence: Presence) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection, presence);
    }

    /// Current presence of a connection, if it has joined a room.
    pub async fn current(&self, connection: &ConnectionId) -> Option<Presence> {
        let connections = self.connections.lock().await;
        connections.get(connection).cloned()
    }

    /// Remove and return a connection's presence. Idempotent: removing an
    /// absent connection returns `None` and mutates nothing, which is what
    /// makes a racing explicit leave and transport disconnect safe.
    pub async fn take(&self, connection: &ConnectionId) -> Option<Presence> {
        let mut connections = self.connections.lock().await;
        connections.remove(connection)
    }

    /// Number of connections currently inside any room.
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}
