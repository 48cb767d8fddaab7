//! The playlist store seam.
//!
//! [`PlaylistStore`] is what the ingestion flow and the listing routes talk
//! to. [`SqlitePlaylistStore`] is the production implementation;
//! [`MemoryPlaylistStore`] keeps everything in a `Vec` for tests and for
//! running without a database file.

use parking_lot::Mutex;
use wp_core::{Result, VideoId};

use crate::models::{NewVideo, RoomSummary, Video};
use crate::pool::{get_conn, DbPool};
use crate::queries::videos;

/// Append-only, room-partitioned playlist storage.
pub trait PlaylistStore: Send + Sync {
    /// Persist a new entry and return it with `id` and `created_at` filled in.
    fn create(&self, new: NewVideo) -> Result<Video>;

    /// Entries in `room`, newest first. Unknown rooms yield an empty list.
    fn list_by_room(&self, room: &str) -> Result<Vec<Video>>;

    /// Rooms that have at least one entry, ordered by name.
    fn list_rooms(&self) -> Result<Vec<RoomSummary>>;

    fn get(&self, id: VideoId) -> Result<Option<Video>>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SqlitePlaylistStore {
    pool: DbPool,
}

impl SqlitePlaylistStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl PlaylistStore for SqlitePlaylistStore {
    fn create(&self, new: NewVideo) -> Result<Video> {
        let conn = get_conn(&self.pool)?;
        videos::create_video(&conn, &new)
    }

    fn list_by_room(&self, room: &str) -> Result<Vec<Video>> {
        let conn = get_conn(&self.pool)?;
        videos::list_by_room(&conn, room)
    }

    fn list_rooms(&self) -> Result<Vec<RoomSummary>> {
        let conn = get_conn(&self.pool)?;
        videos::list_rooms(&conn)
    }

    fn get(&self, id: VideoId) -> Result<Option<Video>> {
        let conn = get_conn(&self.pool)?;
        videos::get_video(&conn, id)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store. Entries live as long as the value does.
#[derive(Default)]
pub struct MemoryPlaylistStore {
    // (insertion sequence, entry)
    entries: Mutex<Vec<(u64, Video)>>,
}

impl MemoryPlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all rooms.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlaylistStore for MemoryPlaylistStore {
    fn create(&self, new: NewVideo) -> Result<Video> {
        let video = Video {
            id: VideoId::new(),
            title: new.title,
            video_url: new.video_url,
            thumbnail_url: new.thumbnail_url,
            room: new.room,
            created_at: videos::now_timestamp(),
        };

        let mut entries = self.entries.lock();
        let seq = entries.len() as u64;
        entries.push((seq, video.clone()));
        Ok(video)
    }

    fn list_by_room(&self, room: &str) -> Result<Vec<Video>> {
        let entries = self.entries.lock();
        let mut matching: Vec<&(u64, Video)> =
            entries.iter().filter(|(_, v)| v.room == room).collect();
        matching.sort_by(|(sa, a), (sb, b)| {
            b.created_at.cmp(&a.created_at).then_with(|| sb.cmp(sa))
        });
        Ok(matching.into_iter().map(|(_, v)| v.clone()).collect())
    }

    fn list_rooms(&self) -> Result<Vec<RoomSummary>> {
        let entries = self.entries.lock();
        let mut counts = std::collections::BTreeMap::<&str, u64>::new();
        for (_, v) in entries.iter() {
            *counts.entry(v.room.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, count)| RoomSummary {
                name: name.to_string(),
                count,
            })
            .collect())
    }

    fn get(&self, id: VideoId) -> Result<Option<Video>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .find(|(_, v)| v.id == id)
            .map(|(_, v)| v.clone()))
    }
}
