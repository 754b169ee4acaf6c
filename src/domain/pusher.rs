//! Outbound message channel interface.
//!
//! The session layer fans events out through this trait; the WebSocket
//! implementation lives in the infrastructure layer. Delivery is
//! best-effort: no acknowledgment, no retry, no durability.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::id::ConnectionId;

/// Per-connection sender for serialized outbound events.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Fan-out seam between room sessions and the transport.
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a connection's outbound channel.
    async fn register_connection(&self, connection: ConnectionId, sender: PusherChannel);

    /// Remove a connection's outbound channel.
    async fn unregister_connection(&self, connection: &ConnectionId);

    /// Send to a single connection. Fails if the connection is unknown or
    /// its channel is closed.
    async fn push_to(&self, connection: &ConnectionId, content: &str) -> Result<(), PushError>;

    /// Send to every target connection, in order, tolerating individual
    /// failures. Targets are a snapshot taken by the caller; membership
    /// changes after the call begins are not reflected.
    async fn broadcast(&self, targets: &[ConnectionId], content: &str) -> Result<(), PushError>;
}
