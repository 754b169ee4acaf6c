//! Room session actor.
//!
//! One task per live room drains that room's command queue, so every
//! transition for a room is applied in a strict sequence and broadcast in
//! the same order. Persistence calls happen inside the loop (write-behind):
//! while one room awaits its store, only that room's queue grows.
//!
//! Retirement: when the membership drains to zero the actor closes its
//! queue, drains what was already enqueued (bouncing any late join back to
//! the dispatcher), marks the room inactive, and reports itself to the
//! registry. A join can therefore never be lost to a racing retirement.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::common::time::Clock;
use crate::domain::{
    ChatMessage, CommandError, ConnectionId, MemberProfile, MessageContent, MessageKind,
    MessagePusher, PlaybackState, Room, RoomId, RoomStore, Timestamp,
};

use super::command::{JoinReply, PlaybackCommand, RoomCommand, RoomSnapshot};
use super::event::ServerEvent;

/// Notification that a session finished retiring.
#[derive(Debug)]
pub(crate) struct RetiredSession {
    pub room_id: RoomId,
    pub generation: u64,
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub(crate) struct SessionDeps {
    pub store: Arc<dyn RoomStore>,
    pub pusher: Arc<dyn MessagePusher>,
    pub clock: Arc<dyn Clock>,
    pub retired_tx: mpsc::UnboundedSender<RetiredSession>,
}

/// Spawn a session actor for `room_id` and return its command queue.
pub(crate) fn spawn_session(
    room_id: RoomId,
    generation: u64,
    deps: SessionDeps,
) -> mpsc::UnboundedSender<RoomCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = RoomSession::new(room_id, generation, deps);
    tokio::spawn(session.run(rx));
    tx
}

struct RoomSession {
    room_id: RoomId,
    generation: u64,
    /// Durable record, loaded lazily on the first join.
    room: Option<Room>,
    playback: PlaybackState,
    /// Live membership: one entry per connected member.
    connections: HashMap<ConnectionId, MemberProfile>,
    /// Display roster, deduplicated by user id and mirrored to the store.
    roster: Vec<MemberProfile>,
    deps: SessionDeps,
}

impl RoomSession {
    fn new(room_id: RoomId, generation: u64, deps: SessionDeps) -> Self {
        Self {
            room_id,
            generation,
            room: None,
            playback: PlaybackState::new(),
            connections: HashMap::new(),
            roster: Vec::new(),
            deps,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        tracing::debug!(room = %self.room_id, generation = self.generation, "room session started");
        while let Some(command) = rx.recv().await {
            self.handle(command).await;
            // The first command is always a join, so an empty membership
            // here means the room has drained (or the join was rejected).
            if self.connections.is_empty() {
                break;
            }
        }
        self.retire(rx).await;
    }

    async fn retire(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        // Stop accepting new commands, then drain what already made it into
        // the queue. Late joins are bounced so the dispatcher retries them
        // against a fresh session.
        rx.close();
        while let Some(command) = rx.recv().await {
            self.bounce(command);
        }
        if self.room.is_some() {
            if let Err(e) = self.deps.store.mark_room_inactive(&self.room_id).await {
                tracing::warn!(room = %self.room_id, "failed to mark room inactive: {}", e);
            }
        }
        let _ = self.deps.retired_tx.send(RetiredSession {
            room_id: self.room_id.clone(),
            generation: self.generation,
        });
        tracing::info!(room = %self.room_id, generation = self.generation, "room session retired");
    }

    fn bounce(&self, command: RoomCommand) {
        match command {
            RoomCommand::Join { reply, .. } => {
                let _ = reply.send(JoinReply::Retired);
            }
            // Leaves on a drained room are no-ops; queued playback/chat
            // commands have no member behind them anymore. Dropping a
            // Snapshot reply closes its channel, which callers treat as
            // "no live session".
            _ => {}
        }
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                connection,
                profile,
                reply,
            } => self.handle_join(connection, profile, reply).await,
            RoomCommand::Leave { connection } => self.handle_leave(connection).await,
            RoomCommand::Playback {
                connection,
                command,
            } => self.handle_playback(connection, command).await,
            RoomCommand::Chat {
                connection,
                content,
            } => self.handle_chat(connection, content).await,
            RoomCommand::Snapshot { reply } => {
                // Before the first join loads the room there is nothing to
                // answer with; the dropped reply reads as "no live session".
                if let Some(snapshot) = self.snapshot() {
                    let _ = reply.send(snapshot);
                }
            }
        }
    }

    async fn handle_join(
        &mut self,
        connection: ConnectionId,
        profile: MemberProfile,
        reply: tokio::sync::oneshot::Sender<JoinReply>,
    ) {
        if let Err(e) = self.ensure_room_loaded().await {
            let _ = reply.send(JoinReply::Rejected(e));
            return;
        }

        self.connections.insert(connection, profile.clone());
        if !self.roster.iter().any(|m| m.user_id == profile.user_id) {
            self.roster.push(profile.clone());
            if let Err(e) = self
                .deps
                .store
                .add_member(&self.room_id, profile.clone())
                .await
            {
                tracing::warn!(room = %self.room_id, "failed to persist member: {}", e);
            }
        }

        let Some(snapshot) = self.snapshot() else {
            let _ = reply.send(JoinReply::Rejected(CommandError::RoomNotFound));
            return;
        };
        let others: Vec<ConnectionId> = self
            .connections
            .keys()
            .filter(|c| **c != connection)
            .copied()
            .collect();
        let _ = reply.send(JoinReply::Joined(Box::new(snapshot)));

        let event = ServerEvent::UserJoined {
            username: profile.username.clone(),
            members: self.roster.clone(),
            total_members: self.roster.len(),
        };
        self.broadcast_to(&others, &event).await;
        tracing::info!(room = %self.room_id, user = %profile.user_id, "member joined");
    }

    async fn handle_leave(&mut self, connection: ConnectionId) {
        let Some(profile) = self.connections.remove(&connection) else {
            // Idempotent: already gone, nothing to broadcast.
            return;
        };
        let user_still_connected = self
            .connections
            .values()
            .any(|p| p.user_id == profile.user_id);
        if !user_still_connected {
            self.roster.retain(|m| m.user_id != profile.user_id);
            if let Err(e) = self
                .deps
                .store
                .remove_member(&self.room_id, &profile.user_id)
                .await
            {
                tracing::warn!(room = %self.room_id, "failed to remove persisted member: {}", e);
            }
            let remaining: Vec<ConnectionId> = self.connections.keys().copied().collect();
            let event = ServerEvent::UserLeft {
                username: profile.username.clone(),
            };
            self.broadcast_to(&remaining, &event).await;
        }
        tracing::info!(room = %self.room_id, user = %profile.user_id, "member left");
    }

    async fn handle_playback(&mut self, connection: ConnectionId, command: PlaybackCommand) {
        let Some(profile) = self.connections.get(&connection).cloned() else {
            self.push_error(&connection, &CommandError::NotInRoom).await;
            return;
        };
        let Some(room) = &self.room else {
            self.push_error(&connection, &CommandError::RoomNotFound)
                .await;
            return;
        };
        if !room.may_control_playback(&profile.user_id) {
            tracing::debug!(
                room = %self.room_id,
                user = %profile.user_id,
                "playback command rejected by authority policy"
            );
            self.push_error(&connection, &CommandError::Unauthorized)
                .await;
            return;
        }

        let now = self.now();
        let persist = !matches!(command, PlaybackCommand::SyncPosition { .. });
        let event = match command {
            PlaybackCommand::Play { track, position } => {
                self.playback.play(track.clone(), position, now);
                ServerEvent::SongStarted {
                    song: track,
                    position,
                    sync_timestamp: self.playback.sync_timestamp(),
                }
            }
            PlaybackCommand::Pause { position } => match self.playback.pause(position, now) {
                Ok(()) => ServerEvent::SongPaused {
                    position,
                    sync_timestamp: self.playback.sync_timestamp(),
                },
                Err(e) => {
                    self.push_error(&connection, &CommandError::Playback(e))
                        .await;
                    return;
                }
            },
            PlaybackCommand::Resume => match self.playback.resume(now) {
                Ok(()) => ServerEvent::SongResumed {
                    position: self.playback.position_seconds(),
                    sync_timestamp: self.playback.sync_timestamp(),
                },
                Err(e) => {
                    self.push_error(&connection, &CommandError::Playback(e))
                        .await;
                    return;
                }
            },
            PlaybackCommand::Seek { position } => match self.playback.seek(position, now) {
                Ok(()) => ServerEvent::SongSeeked {
                    position,
                    sync_timestamp: self.playback.sync_timestamp(),
                },
                Err(e) => {
                    self.push_error(&connection, &CommandError::Playback(e))
                        .await;
                    return;
                }
            },
            PlaybackCommand::SyncPosition { position } => {
                match self.playback.sync_position(position, now) {
                    Ok(()) => ServerEvent::SyncPosition { position },
                    Err(e) => {
                        self.push_error(&connection, &CommandError::Playback(e))
                            .await;
                        return;
                    }
                }
            }
        };

        let targets: Vec<ConnectionId> = self.connections.keys().copied().collect();
        self.broadcast_to(&targets, &event).await;

        if persist {
            if let Err(e) = self
                .deps
                .store
                .persist_room_state(&self.room_id, self.playback.clone())
                .await
            {
                tracing::warn!(room = %self.room_id, "failed to persist room state: {}", e);
            }
        }
    }

    async fn handle_chat(&mut self, connection: ConnectionId, content: MessageContent) {
        let Some(profile) = self.connections.get(&connection).cloned() else {
            self.push_error(&connection, &CommandError::NotInRoom).await;
            return;
        };
        let now = self.now();
        let message = ChatMessage::new(
            self.room_id.clone(),
            profile.user_id.clone(),
            profile.username.clone(),
            content,
            MessageKind::Text,
            now,
        );
        // Persist before fan-out; a storage failure is an operator problem,
        // not a reason to drop the message for live members.
        if let Err(e) = self.deps.store.persist_chat_message(message.clone()).await {
            tracing::warn!(room = %self.room_id, "failed to persist chat message: {}", e);
        }
        let targets: Vec<ConnectionId> = self.connections.keys().copied().collect();
        let event = ServerEvent::ChatMessage {
            username: message.username.clone(),
            content: message.content.as_str().to_string(),
            timestamp: message.timestamp,
        };
        self.broadcast_to(&targets, &event).await;
    }

    async fn ensure_room_loaded(&mut self) -> Result<(), CommandError> {
        if self.room.is_some() {
            return Ok(());
        }
        let room = match self.deps.store.load_room(&self.room_id).await {
            Ok(Some(room)) => room,
            Ok(None) => return Err(CommandError::RoomNotFound),
            Err(e) => {
                tracing::error!(room = %self.room_id, "failed to load room record: {}", e);
                return Err(CommandError::RoomNotFound);
            }
        };
        match self.deps.store.load_room_members(&self.room_id).await {
            Ok(roster) => self.roster = roster,
            Err(e) => {
                tracing::warn!(room = %self.room_id, "failed to load room members: {}", e);
            }
        }
        if !room.is_active {
            if let Err(e) = self.deps.store.mark_room_active(&self.room_id).await {
                tracing::warn!(room = %self.room_id, "failed to re-activate room: {}", e);
            }
        }
        self.room = Some(room);
        Ok(())
    }

    /// Point-in-time view of the session. `None` until the first join has
    /// loaded the room record.
    fn snapshot(&self) -> Option<RoomSnapshot> {
        let room = self.room.as_ref()?;
        let now = self.now();
        let sync_timestamp = if self.playback.is_playing() {
            now
        } else {
            self.playback.sync_timestamp()
        };
        Some(RoomSnapshot {
            room_id: self.room_id.clone(),
            room_name: room.name.clone(),
            host_name: room.host_name.clone(),
            policy: room.policy,
            current_track: self.playback.track().cloned(),
            position_seconds: self.playback.effective_position(now),
            is_playing: self.playback.is_playing(),
            sync_timestamp,
            members: self.roster.clone(),
        })
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.deps.clock.now_millis())
    }

    async fn push_error(&self, connection: &ConnectionId, error: &CommandError) {
        let event = ServerEvent::Error {
            message: error.to_string(),
        };
        if let Err(e) = self.deps.pusher.push_to(connection, &event.to_json()).await {
            tracing::debug!(%connection, "failed to push error event: {}", e);
        }
    }

    async fn broadcast_to(&self, targets: &[ConnectionId], event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.deps.pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!(room = %self.room_id, "broadcast failed: {}", e);
        }
    }
}
