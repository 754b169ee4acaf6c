//! Room entity and its playback-authority policy.

use serde::{Deserialize, Serialize};

use super::id::{RoomId, UserId};
use super::timestamp::Timestamp;

/// Which members may issue playback-mutating commands.
///
/// Configured per room at creation time. `AnyMember` is the default;
/// `HostOnly` restricts playback control to the room's creator. Violations
/// are dropped with an error to the sender and no broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorityPolicy {
    #[default]
    AnyMember,
    HostOnly,
}

/// Durable room record. The in-memory session derives everything else
/// (membership, playback state) and can always be rebuilt from this record
/// plus an empty membership set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub host_id: UserId,
    pub host_name: String,
    pub policy: AuthorityPolicy,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        host_id: UserId,
        host_name: impl Into<String>,
        policy: AuthorityPolicy,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            host_id,
            host_name: host_name.into(),
            policy,
            is_active: true,
            created_at,
            updated_at: created_at,
        }
    }

    /// Apply the room's authority policy to a playback mutation from `user`.
    pub fn may_control_playback(&self, user: &UserId) -> bool {
        match self.policy {
            AuthorityPolicy::AnyMember => true,
            AuthorityPolicy::HostOnly => self.host_id == *user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(policy: AuthorityPolicy) -> Room {
        Room::new(
            RoomId::new("r1").unwrap(),
            "Listening Party",
            UserId::new("host").unwrap(),
            "Host",
            policy,
            Timestamp::new(1_000),
        )
    }

    #[test]
    fn test_any_member_policy_allows_everyone() {
        // テスト項目: any-member ポリシーは全メンバーの操作を許可する
        // given (前提条件):
        let room = room_with(AuthorityPolicy::AnyMember);
        let guest = UserId::new("guest").unwrap();

        // when (操作):
        let allowed = room.may_control_playback(&guest);

        // then (期待する結果):
        assert!(allowed);
    }

    #[test]
    fn test_host_only_policy_rejects_non_host() {
        // テスト項目: host-only ポリシーはホスト以外の操作を拒否する
        // given (前提条件):
        let room = room_with(AuthorityPolicy::HostOnly);
        let guest = UserId::new("guest").unwrap();

        // when (操作):
        let allowed = room.may_control_playback(&guest);

        // then (期待する結果):
        assert!(!allowed);
    }

    #[test]
    fn test_host_only_policy_allows_host() {
        // テスト項目: host-only ポリシーでもホストは操作できる
        // given (前提条件):
        let room = room_with(AuthorityPolicy::HostOnly);
        let host = UserId::new("host").unwrap();

        // when (操作):
        let allowed = room.may_control_playback(&host);

        // then (期待する結果):
        assert!(allowed);
    }

    #[test]
    fn test_new_room_starts_active() {
        // テスト項目: 作成直後の Room はアクティブ
        // given (前提条件):

        // when (操作):
        let room = room_with(AuthorityPolicy::AnyMember);

        // then (期待する結果):
        assert!(room.is_active);
        assert_eq!(room.created_at, room.updated_at);
    }
}
