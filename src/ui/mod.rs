//! Listening-room server surface (WebSocket + HTTP API).

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
