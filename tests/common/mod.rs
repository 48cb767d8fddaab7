//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory playlist store, a
//! scripted extractor, default config, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use sha2::Sha256;

use wp_core::config::Config;
use wp_core::{Error, Result};
use wp_db::MemoryPlaylistStore;
use wp_extract::{Extractor, VideoMetadata, EMPTY_RESULT_MESSAGE};
use wp_server::context::AppContext;
use wp_server::router::build_router;

/// Secret used by tests that enable auth.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Extractor returning canned answers per URL.
///
/// Unknown URLs get the fallback answer, which defaults to the empty
/// result.
pub struct ScriptedExtractor {
    answers: Mutex<HashMap<String, std::result::Result<VideoMetadata, String>>>,
    fallback: Mutex<std::result::Result<VideoMetadata, String>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl Default for ScriptedExtractor {
    fn default() -> Self {
        Self {
            answers: Mutex::new(HashMap::new()),
            fallback: Mutex::new(Err(EMPTY_RESULT_MESSAGE.to_string())),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedExtractor {
    pub fn answer(&self, url: &str, id: Option<&str>, title: Option<&str>, thumbnail: Option<&str>) {
        self.answers.lock().insert(
            url.to_string(),
            Ok(VideoMetadata {
                id: id.map(Into::into),
                title: title.map(Into::into),
                thumbnail: thumbnail.map(Into::into),
            }),
        );
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.answers
            .lock()
            .insert(url.to_string(), Err(message.to_string()));
    }

    pub fn answer_everything(&self, title: &str) {
        *self.fallback.lock() = Ok(VideoMetadata {
            id: None,
            title: Some(title.to_string()),
            thumbnail: None,
        });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn extract(&self, url: &str) -> Result<VideoMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(url.to_string());
        let answer = self
            .answers
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.fallback.lock().clone());
        answer.map_err(Error::ExtractionFailed)
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub store: Arc<MemoryPlaylistStore>,
    pub extractor: Arc<ScriptedExtractor>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryPlaylistStore::new());
        let extractor = Arc::new(ScriptedExtractor::default());
        let ctx = AppContext::new(config, store.clone(), extractor.clone());
        Self {
            ctx,
            store,
            extractor,
        }
    }

    /// Harness with auth enabled and [`TEST_SECRET`] as the token secret.
    pub fn with_auth() -> Self {
        let mut config = Config::default();
        config.auth.enabled = true;
        config.auth.token_secret = Some(TEST_SECRET.to_string());
        Self::with_config(config)
    }

    pub fn router(&self) -> Router {
        build_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    pub async fn serve(self) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            wp_server::serve(listener, ctx, std::future::pending()).await.ok();
        });

        (self, addr)
    }
}

/// Build a JSON POST request.
pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub async fn body_to_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_to_string(response).await).unwrap()
}

/// Mint an HS256 token the way the external auth provider would.
pub fn mint_token(secret: &str, claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{header}.{payload}").as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{header}.{payload}.{sig}")
}

/// Expiry one hour from now, as a Unix timestamp.
pub fn in_one_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}
