//! Shared utilities used by both the library and the server binary.

pub mod logger;
pub mod time;
