//! Infrastructure 層
//!
//! ドメイン層が定義する trait（`RoomStore`, `MessagePusher`）の具体的な実装と、
//! ワイヤフォーマットの DTO を提供します。

pub mod dto;
pub mod pusher;
pub mod store;
