//! Inbound WebSocket command DTOs.
//!
//! Raw client input: ids and positions arrive as plain strings/numbers and
//! are validated at the boundary (`ui::handler`) before any domain value
//! object is constructed. Outbound events are serialized directly from
//! `session::event::ServerEvent`.

use serde::Deserialize;

use crate::domain::Track;

/// One client command, tagged by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
        user_id: String,
        username: String,
        #[serde(default)]
        avatar: Option<String>,
    },
    LeaveRoom {
        room_id: String,
    },
    PlaySong {
        room_id: String,
        song: Track,
        #[serde(default)]
        position: f64,
    },
    PauseSong {
        room_id: String,
        position: f64,
    },
    ResumeSong {
        room_id: String,
    },
    SeekSong {
        room_id: String,
        position: f64,
    },
    SyncPosition {
        room_id: String,
        position: f64,
    },
    ChatMessage {
        room_id: String,
        content: String,
    },
}
