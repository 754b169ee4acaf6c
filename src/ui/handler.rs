//! WebSocket connection handlers and HTTP API handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    common::time::{get_unix_timestamp_millis, timestamp_to_rfc3339},
    domain::{
        CommandError, ConnectionId, MemberProfile, MessageContent, Room, RoomId, RoomIdFactory,
        Timestamp, UserId,
    },
    infrastructure::dto::{
        http::{CreateRoomRequest, HealthDto, RoomCreatedDto, RoomDetailDto, RoomSummaryDto},
        websocket::ClientEvent,
    },
    session::{PlaybackCommand, RoomSnapshot, ServerEvent},
};

use super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Create a channel for this connection to receive fan-out messages
    let connection = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state.pusher.register_connection(connection, tx).await;

    tracing::info!("Connection '{}' established", connection);

    ws.on_upgrade(move |socket| handle_socket(socket, state, connection, rx))
}

pub async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection: ConnectionId,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let state_clone = state.clone();

    // Task receiving commands from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(e) = handle_client_event(&state_clone, connection, &text).await {
                        tracing::debug!("command from '{}' rejected: {}", connection, e);
                        let event = ServerEvent::Error {
                            message: e.to_string(),
                        };
                        // Errors go to the sender only, never broadcast
                        if state_clone
                            .pusher
                            .push_to(&connection, &event.to_json())
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection);
                    break;
                }
                _ => {}
            }
        }
    });

    // Task forwarding fan-out messages to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If either task completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Single cleanup path regardless of which side detected the loss
    state.gateway.disconnect(connection).await;
    tracing::info!("Connection '{}' disconnected", connection);
}

/// Parse, validate at the boundary, and route one client command.
async fn handle_client_event(
    state: &Arc<AppState>,
    connection: ConnectionId,
    raw: &str,
) -> Result<(), CommandError> {
    let event = serde_json::from_str::<ClientEvent>(raw)
        .map_err(|e| CommandError::InvalidCommand(e.to_string()))?;

    match event {
        ClientEvent::JoinRoom {
            room_id,
            user_id,
            username,
            avatar,
        } => {
            let room_id = RoomId::new(room_id)?;
            let user_id = UserId::new(user_id)?;
            if username.trim().is_empty() {
                return Err(CommandError::InvalidCommand(
                    "username must not be empty".to_string(),
                ));
            }
            let profile = MemberProfile::new(user_id, username).with_avatar(avatar);
            let snapshot = state.gateway.join(connection, room_id, profile).await?;
            // The joining connection alone receives the current room state
            let event = room_state_event(snapshot);
            if let Err(e) = state.pusher.push_to(&connection, &event.to_json()).await {
                tracing::warn!("failed to send room-state to '{}': {}", connection, e);
            }
            Ok(())
        }
        ClientEvent::LeaveRoom { room_id } => {
            let room_id = RoomId::new(room_id)?;
            state.gateway.leave(connection, &room_id).await
        }
        ClientEvent::PlaySong {
            room_id,
            song,
            position,
        } => {
            let room_id = RoomId::new(room_id)?;
            let position = validate_position(position)?;
            if song.title.trim().is_empty() {
                return Err(CommandError::InvalidCommand(
                    "song title must not be empty".to_string(),
                ));
            }
            state
                .gateway
                .playback(
                    connection,
                    &room_id,
                    PlaybackCommand::Play {
                        track: song,
                        position,
                    },
                )
                .await
        }
        ClientEvent::PauseSong { room_id, position } => {
            let room_id = RoomId::new(room_id)?;
            let position = validate_position(position)?;
            state
                .gateway
                .playback(connection, &room_id, PlaybackCommand::Pause { position })
                .await
        }
        ClientEvent::ResumeSong { room_id } => {
            let room_id = RoomId::new(room_id)?;
            state
                .gateway
                .playback(connection, &room_id, PlaybackCommand::Resume)
                .await
        }
        ClientEvent::SeekSong { room_id, position } => {
            let room_id = RoomId::new(room_id)?;
            let position = validate_position(position)?;
            state
                .gateway
                .playback(connection, &room_id, PlaybackCommand::Seek { position })
                .await
        }
        ClientEvent::SyncPosition { room_id, position } => {
            let room_id = RoomId::new(room_id)?;
            let position = validate_position(position)?;
            state
                .gateway
                .playback(
                    connection,
                    &room_id,
                    PlaybackCommand::SyncPosition { position },
                )
                .await
        }
        ClientEvent::ChatMessage { room_id, content } => {
            let room_id = RoomId::new(room_id)?;
            let content = MessageContent::new(content)?;
            state.gateway.chat(connection, &room_id, content).await
        }
    }
}

fn validate_position(position: f64) -> Result<f64, CommandError> {
    if !position.is_finite() || position < 0.0 {
        return Err(CommandError::InvalidCommand(format!(
            "position must be a non-negative number, got {}",
            position
        )));
    }
    Ok(position)
}

fn room_state_event(snapshot: RoomSnapshot) -> ServerEvent {
    ServerEvent::RoomState {
        current_track: snapshot.current_track,
        position: snapshot.position_seconds,
        is_playing: snapshot.is_playing,
        sync_timestamp: snapshot.sync_timestamp,
        members: snapshot.members,
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        active_rooms: state.gateway.session_count().await,
        connections: state.gateway.connection_count().await,
        timestamp: timestamp_to_rfc3339(get_unix_timestamp_millis()),
    })
}

/// List active rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, StatusCode> {
    let rooms = state
        .store
        .list_active_rooms()
        .await
        .map_err(|e| {
            tracing::error!("failed to list rooms: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let mut summaries = Vec::with_capacity(rooms.len());
    for room in rooms {
        let members = state
            .store
            .load_room_members(&room.id)
            .await
            .unwrap_or_default();
        let playback = state.store.load_room_state(&room.id).await.ok().flatten();
        summaries.push(RoomSummaryDto::from_record(
            &room,
            members.len(),
            playback.as_ref(),
        ));
    }
    Ok(Json(summaries))
}

/// Create a room record. Members join over the WebSocket channel afterwards.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomCreatedDto>), StatusCode> {
    if request.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let host_id = UserId::new(request.host_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let room = Room::new(
        RoomIdFactory::generate(),
        request.name,
        host_id,
        request.host_name,
        request.policy.unwrap_or_default(),
        Timestamp::new(get_unix_timestamp_millis()),
    );
    let created = RoomCreatedDto {
        room_id: room.id.to_string(),
        name: room.name.clone(),
        policy: room.policy,
    };

    state.store.create_room(room).await.map_err(|e| {
        tracing::error!("failed to create room: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("Room '{}' created", created.room_id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let room = state
        .store
        .load_room(&room_id)
        .await
        .map_err(|e| {
            tracing::error!("failed to load room '{}': {}", room_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    // Prefer the live session view; fall back to the durable record for
    // rooms without one.
    if let Some(snapshot) = state.gateway.snapshot(&room_id).await {
        let summary = RoomSummaryDto {
            room_id: room.id.to_string(),
            name: snapshot.room_name,
            host_name: snapshot.host_name,
            policy: snapshot.policy,
            member_count: snapshot.members.len(),
            is_playing: snapshot.is_playing,
            current_track: snapshot.current_track,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        };
        return Ok(Json(RoomDetailDto {
            summary,
            position: snapshot.position_seconds,
            sync_timestamp: snapshot.sync_timestamp,
            members: snapshot.members,
        }));
    }

    let members = state
        .store
        .load_room_members(&room_id)
        .await
        .unwrap_or_default();
    let playback = state.store.load_room_state(&room_id).await.ok().flatten();
    let summary = RoomSummaryDto::from_record(&room, members.len(), playback.as_ref());
    Ok(Json(RoomDetailDto {
        summary,
        position: playback.as_ref().map_or(0.0, |p| p.position_seconds()),
        sync_timestamp: playback
            .as_ref()
            .map_or(Timestamp::ZERO, |p| p.sync_timestamp()),
        members,
    }))
}
