//! ルーム永続化の実装
//!
//! `RoomStore` trait の具体的な実装を提供します。
//!
//! - `inmemory`: インメモリ実装（プロセス再起動でデータは消えます）

pub mod inmemory;

pub use inmemory::InMemoryRoomStore;
