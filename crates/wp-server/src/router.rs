//! Axum router construction.
//!
//! Builds the full application router with all route groups and
//! middleware layers.

use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "watchparty"),
    paths(
        routes::health::api_health,
        routes::videos::list_videos,
        routes::videos::add_video,
        routes::rooms::list_rooms,
        routes::rooms::list_playlist_rooms,
        routes::auth::auth_status,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::videos::AddVideoRequest,
        routes::videos::VideoResponse,
        routes::rooms::RoomResponse,
        routes::rooms::ActiveRoomResponse,
        routes::auth::AuthStatusResponse,
    ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
///
/// Every path is served both with and without a trailing slash.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Mutating routes need an identity when auth is enabled. Room sockets
    // count: watchers on them drive playback.
    let write_routes = Router::new()
        .route("/videos/add", post(routes::videos::add_video))
        .route("/videos/add/", post(routes::videos::add_video))
        .route("/ws", get(routes::ws::ws_handler))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let read_routes = Router::new()
        .route("/health", get(routes::health::api_health))
        .route("/videos", get(routes::videos::list_videos))
        .route("/videos/", get(routes::videos::list_videos))
        .route("/videos/rooms", get(routes::rooms::list_playlist_rooms))
        .route("/videos/rooms/", get(routes::rooms::list_playlist_rooms))
        .route("/rooms", get(routes::rooms::list_rooms))
        .route("/rooms/", get(routes::rooms::list_rooms))
        .route("/events", get(routes::events::events_handler))
        .route("/auth/status", get(routes::auth::auth_status))
        .route("/openapi.json", get(openapi_json));

    let api = read_routes.merge(write_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_playlist_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/videos/",
            "/api/videos/add/",
            "/api/videos/rooms/",
            "/api/rooms",
            "/api/auth/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
