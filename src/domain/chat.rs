//! Chat messages originated inside a room.
//!
//! Messages are append-only and owned by the persistence collaborator; the
//! core only validates, timestamps, and forwards them.

use serde::Serialize;

use super::error::DomainError;
use super::id::{RoomId, UserId};
use super::timestamp::Timestamp;

/// Upper bound on chat content length, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Validated chat message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidChatContent(
                "message must not be empty".to_string(),
            ));
        }
        if raw.chars().count() > MAX_MESSAGE_LEN {
            return Err(DomainError::InvalidChatContent(format!(
                "message exceeds {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Kind of a chat message. `System` is reserved for server-originated
/// notices in the durable log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    System,
}

/// One chat message as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub username: String,
    pub content: MessageContent,
    pub kind: MessageKind,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        room_id: RoomId,
        sender_id: UserId,
        username: impl Into<String>,
        content: MessageContent,
        kind: MessageKind,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            room_id,
            sender_id,
            username: username.into(),
            content,
            kind,
            timestamp,
        }
    }
}
