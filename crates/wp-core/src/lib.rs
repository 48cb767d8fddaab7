//! wp-core: shared types, IDs, errors, configuration, and event system.
//!
//! This crate is the foundational dependency for all other wp-* crates,
//! providing type-safe identifiers, a unified error type, application
//! configuration, a broadcast event bus for playlist changes, and the live
//! room registry that keeps watchers' players in sync.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod rooms;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;

/// Room used when a caller does not name one.
pub const DEFAULT_ROOM: &str = "general";
