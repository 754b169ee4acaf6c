//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - セッションアクターからのメッセージ送信（push_to, broadcast）
//!
//! WebSocket の受付と sender の生成は UI 層（`src/ui/handler.rs`）で行われ、
//! この実装は生成された sender を受け取って送信のみを担当します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePusher, PushError, PusherChannel};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のコネクションと対応する sender のマップ
    connections: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection, sender);
        tracing::debug!(%connection, "connection registered to MessagePusher");
    }

    async fn unregister_connection(&self, connection: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection);
        tracing::debug!(%connection, "connection unregistered from MessagePusher");
    }

    async fn push_to(&self, connection: &ConnectionId, content: &str) -> Result<(), PushError> {
        let connections = self.connections.lock().await;

        if let Some(sender) = connections.get(connection) {
            sender
                .send(content.to_string())
                .map_err(|e| PushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(PushError::ConnectionNotFound(connection.to_string()))
        }
    }

    async fn broadcast(&self, targets: &[ConnectionId], content: &str) -> Result<(), PushError> {
        let connections = self.connections.lock().await;

        for target in targets {
            if let Some(sender) = connections.get(target) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!(connection = %target, "failed to push message: {}", e);
                }
            } else {
                tracing::warn!(connection = %target, "connection not found during broadcast, skipping");
            }
        }

        Ok(())
    }
}
