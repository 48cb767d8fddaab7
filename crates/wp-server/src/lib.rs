//! wp-server: HTTP API for watchparty.
//!
//! Ties the playlist store, the metadata extractor, and the event bus into
//! an Axum application:
//!
//! - `POST /api/videos/add/` ingests a video URL into a room's playlist
//! - `GET /api/videos/?room=` lists a room's playlist, newest first
//! - `GET /api/ws?room=&username=` keeps a room's players in sync
//! - `GET /api/rooms` lists rooms with connected watchers
//! - `GET /api/videos/rooms/` and `GET /api/events` for playlist overviews and updates
//! - Graceful shutdown via signal handling

pub mod blocking;
pub mod context;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod router;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use wp_core::config::Config;
use wp_core::Error;
use wp_db::SqlitePlaylistStore;
use wp_extract::{ExtractOptions, Extractor, YtDlpExtractor};

pub use context::AppContext;

/// Build the production extractor, tolerating a missing yt-dlp.
///
/// Without yt-dlp the server still starts; adds then fail with a spawn
/// error surfaced as an extraction failure.
pub fn build_extractor(config: &Config) -> Arc<dyn Extractor> {
    match YtDlpExtractor::from_config(&config.extractor) {
        Ok(extractor) => {
            tracing::info!("Using yt-dlp at {}", extractor.path().display());
            Arc::new(extractor)
        }
        Err(e) => {
            tracing::warn!("{e}; adding videos will fail until yt-dlp is installed");
            Arc::new(YtDlpExtractor::new(
                PathBuf::from(wp_extract::tools::YTDLP),
                ExtractOptions::from(&config.extractor),
            ))
        }
    }
}

/// Start the watchparty server and run until a shutdown signal arrives.
pub async fn start(config: Config) -> wp_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db_path = config.server.db_path.clone();
    let existed = db_path.exists();
    let pool = wp_db::pool::init_pool(&db_path)?;
    if existed {
        tracing::info!("Database opened (existing) at {}", db_path.display());
    } else {
        tracing::info!("Database created (new) at {}", db_path.display());
    }

    let store = Arc::new(SqlitePlaylistStore::new(pool));
    let extractor = build_extractor(&config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, store, extractor);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting server on {addr}");

    serve(listener, ctx, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve the API on an already-bound listener until `shutdown` resolves.
///
/// Open SSE streams and room sockets are told to finish once shutdown
/// begins so the graceful drain does not wait on them.
pub async fn serve<F>(listener: TcpListener, ctx: AppContext, shutdown: F) -> wp_core::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router::build_router(ctx.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            ctx.begin_shutdown();
        })
        .await?;
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
