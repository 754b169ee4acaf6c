//! Persistence collaborator interface.
//!
//! The domain defines the data access it needs; the infrastructure layer
//! provides the implementation (dependency inversion). Persistence is
//! write-behind for the real-time path: a storage failure is logged by the
//! caller and never blocks an in-memory transition or its broadcast.

use async_trait::async_trait;
use thiserror::Error;

use super::chat::ChatMessage;
use super::id::{RoomId, UserId};
use super::member::MemberProfile;
use super::playback::PlaybackState;
use super::room::Room;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Durable record store for rooms, their member mirror, playback snapshots
/// and the chat log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Persist a newly created room record.
    async fn create_room(&self, room: Room) -> Result<(), StoreError>;

    /// Load one room record, active or not.
    async fn load_room(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError>;

    /// List all rooms currently marked active.
    async fn list_active_rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// Add a member to the room's durable member mirror.
    async fn add_member(&self, room_id: &RoomId, member: MemberProfile) -> Result<(), StoreError>;

    /// Remove a member from the room's durable member mirror.
    async fn remove_member(&self, room_id: &RoomId, user_id: &UserId) -> Result<(), StoreError>;

    /// Load the durable member mirror, used to seed a session's roster.
    async fn load_room_members(&self, room_id: &RoomId) -> Result<Vec<MemberProfile>, StoreError>;

    /// Append one chat message to the room's log.
    async fn persist_chat_message(&self, message: ChatMessage) -> Result<(), StoreError>;

    /// Write back the room's authoritative playback state.
    async fn persist_room_state(
        &self,
        room_id: &RoomId,
        state: PlaybackState,
    ) -> Result<(), StoreError>;

    /// Load the last written-back playback state, if any.
    async fn load_room_state(&self, room_id: &RoomId)
    -> Result<Option<PlaybackState>, StoreError>;

    /// Mark a drained room inactive. The record is retained, not deleted.
    async fn mark_room_inactive(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// Re-activate a room that receives a join after being marked inactive.
    async fn mark_room_active(&self, room_id: &RoomId) -> Result<(), StoreError>;
}
