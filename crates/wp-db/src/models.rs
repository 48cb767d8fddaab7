//! Rust structs mapping to database tables.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wp_core::VideoId;

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub room: String,
    /// RFC 3339, microsecond precision, UTC.
    pub created_at: String,
}

/// Column list matching [`Video::from_row`].
pub(crate) const VIDEO_COLUMNS: &str = "id, title, video_url, thumbnail_url, room, created_at";

impl Video {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            title: row.get(1)?,
            video_url: row.get(2)?,
            thumbnail_url: row.get(3)?,
            room: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// Fields supplied when appending an entry; the store assigns the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub room: String,
}

/// Entry count for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    pub count: u64,
}
