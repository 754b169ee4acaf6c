//! Error types shared across the domain.

use thiserror::Error;

use super::playback::PlaybackError;

/// Validation failures raised when constructing domain value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid room id: '{0}'")]
    InvalidRoomId(String),

    #[error("invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("invalid chat content: {0}")]
    InvalidChatContent(String),
}

/// Rejection of an inbound command, reported to the issuing connection only.
/// No variant aborts the process or reaches other room members.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The connection has not joined any room yet.
    #[error("not authenticated in any room")]
    Unauthenticated,

    /// The command names a room the connection is not a member of.
    #[error("not in this room")]
    NotInRoom,

    /// Authority-policy violation in a host-only room. The command is
    /// dropped without any broadcast.
    #[error("only the room host can control playback")]
    Unauthorized,

    #[error("room not found")]
    RoomNotFound,

    /// Malformed or out-of-range input, rejected at the boundary before
    /// reaching the state machine.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl From<DomainError> for CommandError {
    fn from(err: DomainError) -> Self {
        CommandError::InvalidCommand(err.to_string())
    }
}
