//! Application context shared by all request handlers.

use std::sync::Arc;

use tokio::sync::watch;
use wp_core::config::Config;
use wp_core::events::EventBus;
use wp_core::rooms::RoomRegistry;
use wp_db::PlaylistStore;
use wp_extract::Extractor;

use crate::ingest::IngestService;

/// State handed to every handler via Axum.
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    pub store: Arc<dyn PlaylistStore>,
    pub extractor: Arc<dyn Extractor>,
    /// Broadcast event bus for SSE.
    pub event_bus: Arc<EventBus>,
    /// Live rooms behind `/api/ws`.
    pub rooms: Arc<RoomRegistry>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: Arc<dyn PlaylistStore>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            store,
            extractor,
            event_bus: Arc::new(EventBus::default()),
            rooms: Arc::new(RoomRegistry::new()),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Ingestion service wired to this context's collaborators.
    pub fn ingest(&self) -> IngestService {
        IngestService::new(
            self.store.clone(),
            self.extractor.clone(),
            self.event_bus.clone(),
            self.config.playlist.clone(),
        )
    }

    /// Tell long-lived responses (SSE streams, room sockets) to finish.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Receiver that flips to `true` once [`AppContext::begin_shutdown`] runs.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
