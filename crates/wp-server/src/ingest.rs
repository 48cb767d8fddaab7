//! Add-video-by-URL ingestion.
//!
//! Validates the request, asks the extractor for metadata, applies the
//! title and thumbnail fallbacks, appends one playlist entry, and announces
//! it on the event bus. Each failure kind maps to its own error variant and
//! nothing is written unless every step before the write succeeded.

use std::sync::Arc;

use wp_core::config::PlaylistConfig;
use wp_core::events::{EventBus, EventPayload};
use wp_core::{Error, Result};
use wp_db::{NewVideo, PlaylistStore, Video};
use wp_extract::{Extractor, VideoMetadata};

use crate::blocking;

/// Title stored when the extractor reports none.
pub const UNKNOWN_TITLE: &str = "Unknown Video";

/// Longest title kept, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Pick the title to store.
pub fn derive_title(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t.chars().take(MAX_TITLE_LEN).collect(),
        _ => UNKNOWN_TITLE.to_string(),
    }
}

/// Pick the thumbnail to store.
///
/// The extractor's own thumbnail wins. Without one, a video id is assumed to
/// be a YouTube id and the standard preview image URL is built from it.
pub fn derive_thumbnail(meta: &VideoMetadata) -> Option<String> {
    if let Some(thumb) = meta.thumbnail.as_deref().filter(|t| !t.trim().is_empty()) {
        return Some(thumb.to_string());
    }
    meta.id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))
}

pub struct IngestService {
    store: Arc<dyn PlaylistStore>,
    extractor: Arc<dyn Extractor>,
    event_bus: Arc<EventBus>,
    playlist: PlaylistConfig,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn PlaylistStore>,
        extractor: Arc<dyn Extractor>,
        event_bus: Arc<EventBus>,
        playlist: PlaylistConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            event_bus,
            playlist,
        }
    }

    /// Normalize the requested room: blank means the default room.
    pub fn resolve_room(&self, room: Option<&str>) -> Result<String> {
        let room = room.map(str::trim).unwrap_or_default();
        if room.is_empty() {
            return Ok(self.playlist.default_room.clone());
        }
        if room.chars().count() > self.playlist.max_room_len {
            return Err(Error::Validation(format!(
                "room name must be at most {} characters",
                self.playlist.max_room_len
            )));
        }
        Ok(room.to_string())
    }

    /// Ingest `url` into `room` and return the stored entry.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingInput`] when `url` is absent or blank; the extractor
    ///   is not called.
    /// - [`Error::Validation`] when `room` is too long.
    /// - [`Error::ExtractionFailed`] with the extractor's message.
    /// - [`Error::PersistenceFailed`] when the store rejects the write.
    pub async fn add_video(&self, url: Option<&str>, room: Option<&str>) -> Result<Video> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::MissingInput("URL is required".into()))?;
        let room = self.resolve_room(room)?;

        tracing::debug!(url, room = %room, extractor = self.extractor.name(), "Extracting video info");

        let meta = self.extractor.extract(url).await.map_err(|e| {
            tracing::warn!(url, room = %room, error = %e, details = ?e, "Video extraction failed");
            match e {
                Error::ExtractionFailed(_) => e,
                other => Error::ExtractionFailed(other.to_string()),
            }
        })?;

        let new = NewVideo {
            title: derive_title(meta.title.as_deref()),
            video_url: url.to_string(),
            thumbnail_url: derive_thumbnail(&meta),
            room,
        };

        let store = Arc::clone(&self.store);
        let video = blocking::run(move || store.create(new)).await.map_err(|e| {
            tracing::error!(url, error = %e, details = ?e, "Failed to save video");
            Error::PersistenceFailed(e.to_string())
        })?;

        self.event_bus.broadcast(
            &video.room,
            EventPayload::VideoAdded {
                video_id: video.id,
                title: video.title.clone(),
            },
        );

        tracing::info!(
            video_id = %video.id,
            room = %video.room,
            title = %video.title,
            "Video added"
        );

        Ok(video)
    }
}
