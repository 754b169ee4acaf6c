//! Commands applied by a room session actor, and their replies.

use tokio::sync::oneshot;

use crate::domain::{
    AuthorityPolicy, CommandError, ConnectionId, MemberProfile, MessageContent, RoomId, Timestamp,
    Track,
};

/// Playback mutations. Subject to the room's authority policy.
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    Play { track: Track, position: f64 },
    Pause { position: f64 },
    Resume,
    Seek { position: f64 },
    SyncPosition { position: f64 },
}

/// One command on a room's serialized queue.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        connection: ConnectionId,
        profile: MemberProfile,
        reply: oneshot::Sender<JoinReply>,
    },
    /// Idempotent: a connection that is not a member is a no-op.
    /// Covers both explicit leave-room and transport-level disconnect.
    Leave {
        connection: ConnectionId,
    },
    Playback {
        connection: ConnectionId,
        command: PlaybackCommand,
    },
    Chat {
        connection: ConnectionId,
        content: MessageContent,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// Reply to a join attempt.
#[derive(Debug)]
pub enum JoinReply {
    Joined(Box<RoomSnapshot>),
    Rejected(CommandError),
    /// The session retired while this join was queued; the dispatcher must
    /// retry against a fresh session.
    Retired,
}

/// Point-in-time view of a room session, answered to joining clients and
/// state queries.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub room_name: String,
    pub host_name: String,
    pub policy: AuthorityPolicy,
    pub current_track: Option<Track>,
    pub position_seconds: f64,
    pub is_playing: bool,
    pub sync_timestamp: Timestamp,
    pub members: Vec<MemberProfile>,
}
