//! Synchronous store calls, moved off the async workers.
//!
//! r2d2 checkouts and rusqlite statements block the calling thread, and a
//! locked database can hold a statement in `busy_timeout` for seconds.

use wp_core::{Error, Result};

/// Run `f` on tokio's blocking pool and wait for it.
///
/// A panic inside `f` comes back as [`Error::Internal`].
pub async fn run<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("blocking task failed: {e}")))?
}
