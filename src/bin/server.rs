//! Synchronized listening-room server.
//!
//! Keeps one authoritative playback timeline per room and fans playback,
//! presence, and chat events out to all room members over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tunesync::{
    common::{logger::setup_logger, time::SystemClock},
    infrastructure::{pusher::WebSocketMessagePusher, store::InMemoryRoomStore},
    session::{RoomGateway, RoomRegistry},
    ui::Server,
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Synchronized listening-room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. RoomStore
    // 2. MessagePusher
    // 3. RoomRegistry
    // 4. RoomGateway
    // 5. Server

    // 1. Create RoomStore (in-memory database)
    let store = Arc::new(InMemoryRoomStore::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create RoomRegistry (one session actor per room id)
    let registry = RoomRegistry::new(store.clone(), pusher.clone(), Arc::new(SystemClock));

    // 4. Create RoomGateway (connection-facing command entry point)
    let gateway = Arc::new(RoomGateway::new(registry, pusher.clone()));

    // 5. Create and run the server
    let server = Server::new(gateway, store, pusher);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
