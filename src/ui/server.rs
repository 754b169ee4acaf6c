//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::domain::{MessagePusher, RoomStore};
use crate::session::RoomGateway;

use super::{
    handler::{create_room, get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Synchronized listening-room server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(gateway, store, pusher);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// RoomGateway（接続から各ルームアクターへの入口）
    gateway: Arc<RoomGateway>,
    /// RoomStore（データアクセス層の抽象化）
    store: Arc<dyn RoomStore>,
    /// MessagePusher（メッセージ通知の抽象化）
    pusher: Arc<dyn MessagePusher>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `gateway` - Command entry point for WebSocket connections
    /// * `store` - Durable record store for rooms
    /// * `pusher` - Outbound message channel registry
    pub fn new(
        gateway: Arc<RoomGateway>,
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            gateway,
            store,
            pusher,
        }
    }

    /// Run the listening-room server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            gateway: self.gateway,
            store: self.store,
            pusher: self.pusher,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Listening-room server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
