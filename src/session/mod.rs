//! Per-room synchronization core.
//!
//! Each room id maps to exactly one session actor: a tokio task draining an
//! mpsc command queue. All commands for a room are applied in queue order
//! (single writer), commands for different rooms run fully in parallel, and
//! there is no lock shared across room command processing.

mod actor;
mod command;
mod event;
mod gateway;
mod presence;
mod registry;

pub use command::{JoinReply, PlaybackCommand, RoomCommand, RoomSnapshot};
pub use event::ServerEvent;
pub use gateway::RoomGateway;
pub use presence::{Presence, PresenceTracker};
pub use registry::RoomRegistry;
