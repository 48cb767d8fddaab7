//! Playlist route handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use wp_core::Error;
use wp_db::Video;

use crate::blocking;
use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Request body for adding a video.
///
/// Both fields are optional at the JSON level so a missing `url` is
/// reported as `missing_input` rather than a deserialization error.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct AddVideoRequest {
    pub url: Option<String>,
    /// Defaults to the configured default room.
    pub room: Option<String>,
}

/// Playlist entry response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub room: String,
    pub created_at: String,
}

impl From<Video> for VideoResponse {
    fn from(v: Video) -> Self {
        Self {
            id: v.id.to_string(),
            title: v.title,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            room: v.room,
            created_at: v.created_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomQuery {
    /// Room to list; the default room when omitted.
    pub room: Option<String>,
}

/// GET /api/videos/
#[utoipa::path(
    get,
    path = "/api/videos/",
    params(RoomQuery),
    responses(
        (status = 200, description = "Room playlist, newest first", body = Vec<VideoResponse>)
    )
)]
pub async fn list_videos(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let room = query
        .room
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(ctx.config.playlist.default_room.as_str())
        .to_string();

    let store = Arc::clone(&ctx.store);
    let videos = blocking::run({
        let room = room.clone();
        move || store.list_by_room(&room)
    })
    .await
    .map_err(|e| AppError::new(e).with_request_id(&request_id))?;

    tracing::debug!(room = %room, count = videos.len(), "Listed playlist");
    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

/// POST /api/videos/add/
#[utoipa::path(
    post,
    path = "/api/videos/add/",
    request_body = AddVideoRequest,
    responses(
        (status = 201, description = "Video added", body = VideoResponse),
        (status = 400, description = "Missing URL, extraction failure, or save failure"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn add_video(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<AddVideoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = match payload {
        Ok(Json(request)) => request,
        // No JSON body at all: there is no URL.
        Err(JsonRejection::MissingJsonContentType(_)) => AddVideoRequest::default(),
        Err(rejection) => {
            return Err(AppError::new(Error::Validation(rejection.body_text()))
                .with_request_id(&request_id))
        }
    };

    let video = ctx
        .ingest()
        .add_video(request.url.as_deref(), request.room.as_deref())
        .await
        .map_err(|e| AppError::new(e).with_request_id(&request_id))?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(video))))
}
