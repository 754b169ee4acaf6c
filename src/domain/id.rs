//! Identifier value objects.
//!
//! Ids arriving from the wire are validated at construction; once a
//! `RoomId`/`UserId` exists it is known to be well-formed.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::error::DomainError;

const MAX_ID_LEN: usize = 64;

/// Stable identifier of a listening room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() || raw.len() > MAX_ID_LEN {
            return Err(DomainError::InvalidRoomId(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Factory for server-generated room ids.
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> RoomId {
        RoomId(Uuid::new_v4().to_string())
    }
}

/// Identifier of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() || raw.len() > MAX_ID_LEN {
            return Err(DomainError::InvalidUserId(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one WebSocket connection. Server-assigned, never parsed
/// from client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_rejects_empty_string() {
        // テスト項目: 空文字の RoomId は拒否される
        // given (前提条件):
        let raw = "   ";

        // when (操作):
        let result = RoomId::new(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(DomainError::InvalidRoomId(_))));
    }

    #[test]
    fn test_room_id_rejects_overlong_string() {
        // テスト項目: 64 文字を超える RoomId は拒否される
        // given (前提条件):
        let raw = "x".repeat(65);

        // when (操作):
        let result = RoomId::new(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_room_id_accepts_valid_string() {
        // テスト項目: 妥当な RoomId が生成できる
        // given (前提条件):
        let raw = "room_1700000000";

        // when (操作):
        let room_id = RoomId::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(room_id.as_str(), "room_1700000000");
    }

    #[test]
    fn test_generated_room_ids_are_unique() {
        // テスト項目: RoomIdFactory は毎回異なる ID を生成する
        // given (前提条件):

        // when (操作):
        let a = RoomIdFactory::generate();
        let b = RoomIdFactory::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }

    #[test]
    fn test_user_id_rejects_empty_string() {
        // テスト項目: 空文字の UserId は拒否される
        // given (前提条件):
        let raw = "";

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(DomainError::InvalidUserId(_))));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: ConnectionId は接続ごとに一意
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }
}
