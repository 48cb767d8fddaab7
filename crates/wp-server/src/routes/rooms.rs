//! Room listings: who is watching right now, and which playlists exist.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::blocking;
use crate::context::AppContext;
use crate::error::AppError;

/// A room with a live watcher count.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActiveRoomResponse {
    pub name: String,
    /// Connected watchers.
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RoomResponse {
    pub name: String,
    /// Number of playlist entries in the room.
    pub count: u64,
}

/// GET /api/rooms
#[utoipa::path(
    get,
    path = "/api/rooms",
    responses(
        (status = 200, description = "Rooms with connected watchers", body = Vec<ActiveRoomResponse>)
    )
)]
pub async fn list_rooms(State(ctx): State<AppContext>) -> Json<Vec<ActiveRoomResponse>> {
    Json(
        ctx.rooms
            .active_rooms()
            .into_iter()
            .map(|r| ActiveRoomResponse {
                name: r.name,
                count: r.count,
            })
            .collect(),
    )
}

/// GET /api/videos/rooms/
#[utoipa::path(
    get,
    path = "/api/videos/rooms/",
    responses(
        (status = 200, description = "Rooms with playlist entry counts", body = Vec<RoomResponse>)
    )
)]
pub async fn list_playlist_rooms(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let store = Arc::clone(&ctx.store);
    let rooms = blocking::run(move || store.list_rooms()).await?;
    Ok(Json(
        rooms
            .into_iter()
            .map(|r| RoomResponse {
                name: r.name,
                count: r.count,
            })
            .collect(),
    ))
}
