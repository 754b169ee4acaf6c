//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::common::time::timestamp_to_rfc3339;
use crate::domain::{AuthorityPolicy, MemberProfile, PlaybackState, Room, Timestamp, Track};

/// `POST /api/rooms` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    pub host_id: String,
    pub host_name: String,
    /// Playback-authority policy, `any-member` when omitted.
    #[serde(default)]
    pub policy: Option<AuthorityPolicy>,
}

/// One room in the `GET /api/rooms` listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub name: String,
    pub host_name: String,
    pub policy: AuthorityPolicy,
    pub member_count: usize,
    pub is_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_track: Option<Track>,
    pub created_at: String,
}

impl RoomSummaryDto {
    pub fn from_record(room: &Room, member_count: usize, state: Option<&PlaybackState>) -> Self {
        Self {
            room_id: room.id.to_string(),
            name: room.name.clone(),
            host_name: room.host_name.clone(),
            policy: room.policy,
            member_count,
            is_playing: state.is_some_and(PlaybackState::is_playing),
            current_track: state.and_then(|s| s.track().cloned()),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

/// `GET /api/rooms/{room_id}` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    #[serde(flatten)]
    pub summary: RoomSummaryDto,
    pub position: f64,
    pub sync_timestamp: Timestamp,
    pub members: Vec<MemberProfile>,
}

/// `GET /api/health` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: &'static str,
    pub active_rooms: usize,
    pub connections: usize,
    pub timestamp: String,
}

/// `POST /api/rooms` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedDto {
    pub room_id: String,
    pub name: String,
    pub policy: AuthorityPolicy,
}
