//! WebSocket endpoint for live room sync.
//!
//! One socket per watcher. Outgoing traffic comes from the client's outbox
//! in the [`wp_core::rooms::RoomRegistry`]; incoming frames are parsed as
//! [`RoomMessage`]s and dispatched to the registry.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tokio::sync::mpsc;
use wp_core::rooms::RoomMessage;

use crate::context::AppContext;
use crate::error::AppError;

/// Name shown for watchers who do not give one.
pub const ANONYMOUS: &str = "Anon";

/// Longest display name kept, in characters.
pub const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Room to join; the default room when omitted.
    pub room: Option<String>,
    pub username: Option<String>,
}

fn display_name(username: Option<&str>) -> String {
    match username.map(str::trim) {
        Some(name) if !name.is_empty() => name.chars().take(MAX_USERNAME_LEN).collect(),
        _ => ANONYMOUS.to_string(),
    }
}

/// GET /api/ws?room=&username=
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<AppContext>,
    Query(query): Query<WsQuery>,
) -> Result<Response, AppError> {
    // Same room rules as the playlist.
    let room = ctx.ingest().resolve_room(query.room.as_deref())?;
    let username = display_name(query.username.as_deref());

    Ok(ws.on_upgrade(move |socket| run_session(socket, ctx, room, username)))
}

async fn send_json(socket: &mut WebSocket, msg: &RoomMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::warn!("Failed to encode room message: {e}");
            true
        }
    }
}

async fn run_session(mut socket: WebSocket, ctx: AppContext, room: String, username: String) {
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let client = ctx.rooms.join(&room, &username, outbox);
    let mut shutdown = ctx.shutdown_receiver();

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            outgoing = inbox.recv() => {
                let Some(msg) = outgoing else { break };
                if !send_json(&mut socket, &msg).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<RoomMessage>(text.as_str()) {
                            Ok(msg) => ctx.rooms.dispatch(&room, client, msg),
                            Err(e) => {
                                tracing::debug!(room = %room, client = %client, "Malformed room message: {e}");
                                let reply = RoomMessage::error(format!("Malformed message: {e}"));
                                if !send_json(&mut socket, &reply).await {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Pings are answered by the protocol layer.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(room = %room, client = %client, "Room socket error: {e}");
                        break;
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    ctx.rooms.leave(&room, client);
}
