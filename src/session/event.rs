//! Outbound events fanned out to room members.
//!
//! Serialized as internally tagged JSON: `{"type": "song-started", ...}`.
//! Event names and field casing are the wire contract shared with clients.

use serde::Serialize;

use crate::domain::{MemberProfile, Timestamp, Track};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent to every member except the joiner.
    UserJoined {
        username: String,
        members: Vec<MemberProfile>,
        total_members: usize,
    },
    UserLeft {
        username: String,
    },
    SongStarted {
        song: Track,
        position: f64,
        sync_timestamp: Timestamp,
    },
    SongPaused {
        position: f64,
        sync_timestamp: Timestamp,
    },
    SongResumed {
        position: f64,
        sync_timestamp: Timestamp,
    },
    SongSeeked {
        position: f64,
        sync_timestamp: Timestamp,
    },
    /// Best-effort drift correction; never persisted.
    SyncPosition {
        position: f64,
    },
    ChatMessage {
        username: String,
        content: String,
        timestamp: Timestamp,
    },
    /// Sent to a joining connection only.
    RoomState {
        current_track: Option<Track>,
        position: f64,
        is_playing: bool,
        sync_timestamp: Timestamp,
        members: Vec<MemberProfile>,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Serialize for the wire. Serialization of these types cannot fail in
    /// practice; if it ever does, degrade to an error event rather than
    /// panicking inside a session actor.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("failed to serialize server event: {}", e);
            r#"{"type":"error","message":"internal serialization failure"}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn test_events_are_tagged_with_kebab_case_names() {
        // テスト項目: イベント名は kebab-case の type フィールドになる
        // given (前提条件):
        let event = ServerEvent::SongStarted {
            song: Track::new("T", "A"),
            position: 0.0,
            sync_timestamp: Timestamp::new(1_000),
        };

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "song-started");
        assert_eq!(value["syncTimestamp"], 1_000);
        assert_eq!(value["song"]["title"], "T");
    }

    #[test]
    fn test_user_joined_carries_member_list() {
        // テスト項目: user-joined はメンバー一覧と人数を含む
        // given (前提条件):
        let members = vec![MemberProfile::new(UserId::new("u1").unwrap(), "Alice")];
        let event = ServerEvent::UserJoined {
            username: "Alice".to_string(),
            members,
            total_members: 1,
        };

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "user-joined");
        assert_eq!(value["totalMembers"], 1);
        assert_eq!(value["members"][0]["userId"], "u1");
        assert_eq!(value["members"][0]["username"], "Alice");
    }

    #[test]
    fn test_room_state_includes_nullable_track() {
        // テスト項目: room-state は未ロード時に null トラックを含む
        // given (前提条件):
        let event = ServerEvent::RoomState {
            current_track: None,
            position: 0.0,
            is_playing: false,
            sync_timestamp: Timestamp::new(0),
            members: vec![],
        };

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "room-state");
        assert!(value["currentTrack"].is_null());
        assert_eq!(value["isPlaying"], false);
    }
}
