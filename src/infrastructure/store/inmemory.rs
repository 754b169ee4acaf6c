//! インメモリの RoomStore 実装
//!
//! ## 責務
//!
//! - ルームレコード、メンバーミラー、再生状態、チャットログの保持
//!
//! 単一プロセス構成のための実装です。データはプロセスのライフタイムに
//! 限って保持されます（永続化バックエンドへの差し替えは trait 境界で
//! 行います）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, MemberProfile, PlaybackState, Room, RoomId, RoomStore, StoreError, UserId,
};

#[derive(Default)]
struct Records {
    rooms: HashMap<RoomId, Room>,
    members: HashMap<RoomId, Vec<MemberProfile>>,
    states: HashMap<RoomId, PlaybackState>,
    messages: HashMap<RoomId, Vec<ChatMessage>>,
}

/// インメモリの RoomStore 実装
pub struct InMemoryRoomStore {
    records: Mutex<Records>,
}

impl Default for InMemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Records::default()),
        }
    }

    /// テストおよび HTTP ハンドラから参照するチャットログの件数
    pub async fn chat_log_len(&self, room_id: &RoomId) -> usize {
        let records = self.records.lock().await;
        records.messages.get(room_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create_room(&self, room: Room) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        tracing::debug!(room = %room.id, "room record created");
        records.rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn load_room(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.rooms.get(room_id).cloned())
    }

    async fn list_active_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let records = self.records.lock().await;
        let mut rooms: Vec<Room> = records
            .rooms
            .values()
            .filter(|room| room.is_active)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }

    async fn add_member(&self, room_id: &RoomId, member: MemberProfile) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if !records.rooms.contains_key(room_id) {
            return Err(StoreError::RoomNotFound(room_id.to_string()));
        }
        let members = records.members.entry(room_id.clone()).or_default();
        if !members.iter().any(|m| m.user_id == member.user_id) {
            members.push(member);
        }
        Ok(())
    }

    async fn remove_member(&self, room_id: &RoomId, user_id: &UserId) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if let Some(members) = records.members.get_mut(room_id) {
            members.retain(|m| m.user_id != *user_id);
        }
        Ok(())
    }

    async fn load_room_members(&self, room_id: &RoomId) -> Result<Vec<MemberProfile>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.members.get(room_id).cloned().unwrap_or_default())
    }

    async fn persist_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        records
            .messages
            .entry(message.room_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn persist_room_state(
        &self,
        room_id: &RoomId,
        state: PlaybackState,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if !records.rooms.contains_key(room_id) {
            return Err(StoreError::RoomNotFound(room_id.to_string()));
        }
        records.states.insert(room_id.clone(), state);
        Ok(())
    }

    async fn load_room_state(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<PlaybackState>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.states.get(room_id).cloned())
    }

    async fn mark_room_inactive(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        match records.rooms.get_mut(room_id) {
            Some(room) => {
                room.is_active = false;
                tracing::debug!(room = %room_id, "room marked inactive");
                Ok(())
            }
            None => Err(StoreError::RoomNotFound(room_id.to_string())),
        }
    }

    async fn mark_room_active(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        match records.rooms.get_mut(room_id) {
            Some(room) => {
                room.is_active = true;
                tracing::debug!(room = %room_id, "room marked active");
                Ok(())
            }
            None => Err(StoreError::RoomNotFound(room_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthorityPolicy, Timestamp};

    fn sample_room(id: &str, created_at: i64) -> Room {
        Room::new(
            RoomId::new(id).unwrap(),
            format!("Room {}", id),
            UserId::new("host").unwrap(),
            "Host",
            AuthorityPolicy::AnyMember,
            Timestamp::new(created_at),
        )
    }

    #[tokio::test]
    async fn test_create_and_load_room() {
        // テスト項目: 作成したルームをロードできる
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let room = sample_room("r1", 1_000);

        // when (操作):
        store.create_room(room.clone()).await.unwrap();
        let loaded = store.load_room(&room.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(loaded, Some(room));
    }

    #[tokio::test]
    async fn test_load_missing_room_returns_none() {
        // テスト項目: 存在しないルームのロードは None
        // given (前提条件):
        let store = InMemoryRoomStore::new();

        // when (操作):
        let loaded = store.load_room(&RoomId::new("ghost").unwrap()).await.unwrap();

        // then (期待する結果):
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_list_active_rooms_excludes_inactive() {
        // テスト項目: 一覧はアクティブなルームだけを新しい順で返す
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let older = sample_room("older", 1_000);
        let newer = sample_room("newer", 2_000);
        let drained = sample_room("drained", 3_000);
        store.create_room(older.clone()).await.unwrap();
        store.create_room(newer.clone()).await.unwrap();
        store.create_room(drained.clone()).await.unwrap();
        store.mark_room_inactive(&drained.id).await.unwrap();

        // when (操作):
        let rooms = store.list_active_rooms().await.unwrap();

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, newer.id);
        assert_eq!(rooms[1].id, older.id);
    }

    #[tokio::test]
    async fn test_member_mirror_deduplicates_by_user() {
        // テスト項目: メンバーミラーはユーザー単位で重複しない
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let room = sample_room("r1", 1_000);
        store.create_room(room.clone()).await.unwrap();
        let alice = MemberProfile::new(UserId::new("alice").unwrap(), "alice");

        // when (操作):
        store.add_member(&room.id, alice.clone()).await.unwrap();
        store.add_member(&room.id, alice.clone()).await.unwrap();

        // then (期待する結果):
        let members = store.load_room_members(&room.id).await.unwrap();
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_member_is_idempotent() {
        // テスト項目: 存在しないメンバーの削除は失敗しない
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let room = sample_room("r1", 1_000);
        store.create_room(room.clone()).await.unwrap();

        // when (操作):
        let result = store
            .remove_member(&room.id, &UserId::new("ghost").unwrap())
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_add_member_to_missing_room_is_rejected() {
        // テスト項目: 存在しないルームへのメンバー追加はエラー
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let alice = MemberProfile::new(UserId::new("alice").unwrap(), "alice");

        // when (操作):
        let result = store
            .add_member(&RoomId::new("ghost").unwrap(), alice)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_persist_and_load_room_state() {
        // テスト項目: 再生状態の書き戻しと読み出し
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let room = sample_room("r1", 1_000);
        store.create_room(room.clone()).await.unwrap();
        let mut state = PlaybackState::new();
        state.play(crate::domain::Track::new("T", "A"), 12.0, Timestamp::new(5_000));

        // when (操作):
        store
            .persist_room_state(&room.id, state.clone())
            .await
            .unwrap();
        let loaded = store.load_room_state(&room.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(loaded, Some(state));
    }

    #[tokio::test]
    async fn test_mark_inactive_retains_the_record() {
        // テスト項目: 非アクティブ化してもレコードは残る
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let room = sample_room("r1", 1_000);
        store.create_room(room.clone()).await.unwrap();

        // when (操作):
        store.mark_room_inactive(&room.id).await.unwrap();

        // then (期待する結果):
        let loaded = store.load_room(&room.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
        store.mark_room_active(&room.id).await.unwrap();
        let reloaded = store.load_room(&room.id).await.unwrap().unwrap();
        assert!(reloaded.is_active);
    }

    #[tokio::test]
    async fn test_chat_log_appends_per_room() {
        // テスト項目: チャットログはルームごとに追記される
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let room = sample_room("r1", 1_000);
        store.create_room(room.clone()).await.unwrap();
        let message = ChatMessage::new(
            room.id.clone(),
            UserId::new("alice").unwrap(),
            "alice",
            crate::domain::MessageContent::new("hello").unwrap(),
            crate::domain::MessageKind::Text,
            Timestamp::new(2_000),
        );

        // when (操作):
        store.persist_chat_message(message.clone()).await.unwrap();
        store.persist_chat_message(message).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.chat_log_len(&room.id).await, 2);
    }
}
