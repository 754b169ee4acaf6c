//! Synchronized listening-room server library.
//!
//! One named room owns one authoritative playback timeline (track, position,
//! playing flag) shared by all members over WebSocket, plus chat and presence
//! fan-out. Each room is serialized by its own session actor; rooms never
//! wait on each other.

// layers
pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod ui;

// shared library
pub mod common;
