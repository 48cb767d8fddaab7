//! wp-db: playlist persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, raw query functions, and the
//! [`store::PlaylistStore`] abstraction the server talks to.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use models::{NewVideo, RoomSummary, Video};
pub use store::{MemoryPlaylistStore, PlaylistStore, SqlitePlaylistStore};
