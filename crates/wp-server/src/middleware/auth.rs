//! Identity middleware.
//!
//! Tokens are issued by an external auth provider as HS256-signed JWTs and
//! reach us either as `Authorization: Bearer <token>` or in the auth cookie.
//! This module only verifies them: signature, `exp`/`nbf`, and the subject
//! claim. When auth is enabled, [`auth_middleware`] rejects requests without
//! a valid token and injects the [`Identity`] into request extensions.

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use wp_core::config::AuthConfig;
use wp_core::{Error, Result};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub username: Option<String>,
}

#[derive(Deserialize)]
struct TokenHeader {
    alg: String,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
    nbf: Option<i64>,
    user_id: Option<serde_json::Value>,
    sub: Option<serde_json::Value>,
    username: Option<String>,
}

fn unauthorized(msg: &str) -> Error {
    Error::Unauthorized(msg.to_string())
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| unauthorized("malformed token"))?;
    serde_json::from_slice(&bytes).map_err(|_| unauthorized("malformed token"))
}

fn claim_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Verify a compact HS256 JWT and return the identity it carries.
///
/// `now` is the current Unix time in seconds.
pub fn verify_token(secret: &str, token: &str, now: i64) -> Result<Identity> {
    let mut parts = token.trim().split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(unauthorized("malformed token"));
    };

    let header: TokenHeader = decode_segment(header_b64)?;
    if header.alg != "HS256" {
        return Err(unauthorized("unsupported token algorithm"));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(sig_b64.trim_end_matches('='))
        .map_err(|_| unauthorized("malformed token"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(format!("invalid token secret: {e}")))?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| unauthorized("invalid token signature"))?;

    let claims: Claims = decode_segment(payload_b64)?;
    if claims.exp.is_some_and(|exp| now >= exp) {
        return Err(unauthorized("token expired"));
    }
    if claims.nbf.is_some_and(|nbf| now < nbf) {
        return Err(unauthorized("token not yet valid"));
    }

    let user_id = claims
        .user_id
        .and_then(claim_to_string)
        .or_else(|| claims.sub.and_then(claim_to_string))
        .ok_or_else(|| unauthorized("token has no subject"))?;

    Ok(Identity {
        user_id,
        username: claims.username,
    })
}

/// Pull the raw token from the `Authorization` header or the auth cookie.
///
/// The header wins when both are present.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    let prefix = format!("{cookie_name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|part| part.strip_prefix(prefix.as_str()))
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Resolve the caller's identity from request headers.
pub fn authenticate(auth: &AuthConfig, headers: &HeaderMap) -> Result<Identity> {
    let secret = auth
        .token_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| unauthorized("token verification is not configured"))?;

    let token = extract_token(headers, &auth.cookie_name)
        .ok_or_else(|| unauthorized("Authentication required"))?;

    verify_token(secret, &token, chrono::Utc::now().timestamp())
}

/// Require an identity on the wrapped routes when auth is enabled.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> std::result::Result<Response, AppError> {
    if !ctx.config.auth.enabled {
        return Ok(next.run(request).await);
    }

    match authenticate(&ctx.config.auth, request.headers()) {
        Ok(identity) => {
            tracing::debug!(user_id = %identity.user_id, "Authenticated request");
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %request.uri().path(), "Rejected unauthenticated request");
            let mut err = AppError::new(e);
            if let Some(rid) = request.extensions().get::<RequestId>() {
                err = err.with_request_id(rid);
            }
            Err(err)
        }
    }
}

/// Generate a random secret suitable for `auth.token_secret`.
pub fn generate_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
