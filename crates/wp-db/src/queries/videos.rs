//! Playlist entry queries.

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use wp_core::{Error, Result, VideoId};

use crate::models::{NewVideo, RoomSummary, Video, VIDEO_COLUMNS};

/// Current time in the stored `created_at` format.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Append a new entry, assigning its id and creation time.
pub fn create_video(conn: &Connection, new: &NewVideo) -> Result<Video> {
    let id = VideoId::new();
    let created_at = now_timestamp();

    conn.execute(
        "INSERT INTO videos (id, title, video_url, thumbnail_url, room, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            new.title,
            new.video_url,
            new.thumbnail_url,
            new.room,
            created_at
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Video {
        id,
        title: new.title.clone(),
        video_url: new.video_url.clone(),
        thumbnail_url: new.thumbnail_url.clone(),
        room: new.room.clone(),
        created_at,
    })
}

/// Get an entry by ID.
pub fn get_video(conn: &Connection, id: VideoId) -> Result<Option<Video>> {
    let result = conn.query_row(
        &format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?1"),
        [id.to_string()],
        Video::from_row,
    );
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List a room's entries, newest first.
///
/// Entries sharing a timestamp come back in reverse insertion order.
pub fn list_by_room(conn: &Connection, room: &str) -> Result<Vec<Video>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE room = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([room], Video::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Distinct rooms with their entry counts, ordered by name.
pub fn list_rooms(conn: &Connection) -> Result<Vec<RoomSummary>> {
    let mut stmt = conn
        .prepare("SELECT room, COUNT(*) FROM videos GROUP BY room ORDER BY room")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RoomSummary {
                name: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
