//! Data Transfer Objects (DTOs) for the listening-room server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: inbound WebSocket command DTOs
//! - `http`: HTTP API request/response DTOs

pub mod http;
pub mod websocket;
