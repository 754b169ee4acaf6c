//! Domain model for synchronized listening rooms.
//!
//! Pure types and the playback state machine live here, together with the
//! interfaces the domain requires from infrastructure ([`RoomStore`],
//! [`MessagePusher`]). Concrete implementations are provided by the
//! infrastructure layer (dependency inversion).

mod chat;
mod error;
mod id;
mod member;
pub mod playback;
mod pusher;
mod room;
mod store;
mod timestamp;

pub use chat::{ChatMessage, MAX_MESSAGE_LEN, MessageContent, MessageKind};
pub use error::{CommandError, DomainError};
pub use id::{ConnectionId, RoomId, RoomIdFactory, UserId};
pub use member::MemberProfile;
pub use playback::{PlaybackError, PlaybackState, PlaybackStatus, Track};
pub use pusher::{MessagePusher, PushError, PusherChannel};
pub use room::{AuthorityPolicy, Room};
pub use store::{RoomStore, StoreError};
pub use timestamp::Timestamp;

#[cfg(test)]
pub use store::MockRoomStore;
