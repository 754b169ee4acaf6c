//! Command entry point for connections.
//!
//! Resolves a connection to its current room through the presence tracker,
//! then dispatches onto that room's serialized queue. This is the only
//! place that mutates presence, and the only caller of the registry.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::domain::{
    CommandError, ConnectionId, MemberProfile, MessageContent, MessagePusher, RoomId,
};

use super::command::{JoinReply, PlaybackCommand, RoomCommand, RoomSnapshot};
use super::presence::{Presence, PresenceTracker};
use super::registry::RoomRegistry;

/// Bounds re-dispatch when a join keeps racing session retirements.
const MAX_JOIN_ATTEMPTS: usize = 3;

pub struct RoomGateway {
    registry: Arc<RoomRegistry>,
    presence: PresenceTracker,
    pusher: Arc<dyn MessagePusher>,
}

impl RoomGateway {
    pub fn new(registry: Arc<RoomRegistry>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            presence: PresenceTracker::new(),
            pusher,
        }
    }

    /// Join `room_id`. If the connection is already in a different room it
    /// implicitly leaves that room first; no connection is ever a member of
    /// two rooms. Joining the room it already occupies answers with the
    /// current snapshot without re-joining. On success the caller receives
    /// the room snapshot to answer the joining client with.
    pub async fn join(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        profile: MemberProfile,
    ) -> Result<RoomSnapshot, CommandError> {
        match self.presence.current(&connection).await {
            Some(previous) if previous.room_id == room_id => {
                // Already a member: no second Join, no user-joined
                // re-broadcast for an existing member.
                if let Some(snapshot) = self.registry.snapshot(&room_id).await {
                    return Ok(snapshot);
                }
                // Session vanished under a live member; rebuild it below.
            }
            Some(previous) => {
                self.presence.take(&connection).await;
                self.registry
                    .dispatch(&previous.room_id, RoomCommand::Leave { connection })
                    .await;
            }
            None => {}
        }

        for _ in 0..MAX_JOIN_ATTEMPTS {
            let (reply_tx, reply_rx) = oneshot::channel();
            self.registry
                .dispatch(
                    &room_id,
                    RoomCommand::Join {
                        connection,
                        profile: profile.clone(),
                        reply: reply_tx,
                    },
                )
                .await;
            match reply_rx.await {
                Ok(JoinReply::Joined(snapshot)) => {
                    self.presence
                        .record(
                            connection,
                            Presence {
                                room_id: room_id.clone(),
                                user_id: profile.user_id.clone(),
                                username: profile.username.clone(),
                            },
                        )
                        .await;
                    return Ok(*snapshot);
                }
                Ok(JoinReply::Rejected(err)) => return Err(err),
                // Session retired under us (or dropped the reply while
                // retiring); retry against a fresh one.
                Ok(JoinReply::Retired) | Err(_) => continue,
            }
        }
        Err(CommandError::RoomNotFound)
    }

    /// Explicit leave-room. Idempotent: a connection that is not in any
    /// room is a no-op, not an error.
    pub async fn leave(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), CommandError> {
        match self.presence.current(&connection).await {
            Some(presence) if presence.room_id == *room_id => {
                self.presence.take(&connection).await;
                self.registry
                    .dispatch(room_id, RoomCommand::Leave { connection })
                    .await;
                Ok(())
            }
            Some(_) => Err(CommandError::NotInRoom),
            None => Ok(()),
        }
    }

    /// Transport-level connection loss. Must be called exactly once per
    /// connection; the idempotent presence take makes a race with an
    /// explicit leave harmless (no duplicate user-left broadcast).
    pub async fn disconnect(&self, connection: ConnectionId) {
        if let Some(previous) = self.presence.take(&connection).await {
            self.registry
                .dispatch(&previous.room_id, RoomCommand::Leave { connection })
                .await;
        }
        self.pusher.unregister_connection(&connection).await;
    }

    /// Playback mutation for the room the connection is a member of.
    pub async fn playback(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
        command: PlaybackCommand,
    ) -> Result<(), CommandError> {
        self.ensure_member(&connection, room_id).await?;
        self.registry
            .dispatch(
                room_id,
                RoomCommand::Playback {
                    connection,
                    command,
                },
            )
            .await;
        Ok(())
    }

    /// Chat message to the room the connection is a member of.
    pub async fn chat(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
        content: MessageContent,
    ) -> Result<(), CommandError> {
        self.ensure_member(&connection, room_id).await?;
        self.registry
            .dispatch(
                room_id,
                RoomCommand::Chat {
                    connection,
                    content,
                },
            )
            .await;
        Ok(())
    }

    pub async fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        self.registry.snapshot(room_id).await
    }

    pub async fn connection_count(&self) -> usize {
        self.presence.connection_count().await
    }

    pub async fn session_count(&self) -> usize {
        self.registry.session_count().await
    }

    async fn ensure_member(
        &self,
        connection: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), CommandError> {
        match self.presence.current(connection).await {
            None => Err(CommandError::Unauthenticated),
            Some(presence) if presence.room_id != *room_id => Err(CommandError::NotInRoom),
            Some(_) => Ok(()),
        }
    }
}
