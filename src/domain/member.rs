//! Room member profile.

use serde::Serialize;

use super::id::UserId;

/// Who a connection is inside a room: user identity plus display data.
///
/// A member belongs to at most one room per connection; the session actor
/// keys its live membership map by `ConnectionId` and stores one of these
/// per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub user_id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl MemberProfile {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }
}
