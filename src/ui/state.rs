//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::{MessagePusher, RoomStore};
use crate::session::RoomGateway;

/// Shared application state
pub struct AppState {
    /// RoomGateway（接続から各ルームアクターへの入口）
    pub gateway: Arc<RoomGateway>,
    /// RoomStore（データアクセス層の抽象化）
    pub store: Arc<dyn RoomStore>,
    /// MessagePusher（メッセージ通知の抽象化）
    pub pusher: Arc<dyn MessagePusher>,
}
