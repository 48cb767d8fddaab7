//! Identity status route.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::middleware::auth::authenticate;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// GET /api/auth/status
///
/// With auth disabled every caller counts as authenticated.
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let auth_config = &ctx.config.auth;

    if !auth_config.enabled {
        return Json(AuthStatusResponse {
            auth_enabled: false,
            authenticated: true,
            user_id: None,
            username: None,
        });
    }

    match authenticate(auth_config, &headers) {
        Ok(identity) => Json(AuthStatusResponse {
            auth_enabled: true,
            authenticated: true,
            user_id: Some(identity.user_id),
            username: identity.username,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Auth status: not authenticated");
            Json(AuthStatusResponse {
                auth_enabled: true,
                authenticated: false,
                user_id: None,
                username: None,
            })
        }
    }
}
