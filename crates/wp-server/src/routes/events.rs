//! Server-Sent Events (SSE) handler.
//!
//! Subscribes to the [`wp_core::events::EventBus`], optionally filters by
//! room, replays recent events for late joiners, and sends heartbeats.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use crate::context::AppContext;

/// How many past events a new subscriber is sent.
const REPLAY_EVENTS: usize = 50;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only deliver events for this room.
    pub room: Option<String>,
}

fn to_sse(event: &wp_core::events::Event) -> Option<Event> {
    let data = serde_json::to_string(event).ok()?;
    Some(
        Event::default()
            .id(event.id.to_string())
            .event(event.payload.kind())
            .data(data),
    )
}

/// GET /api/events -- SSE stream of playlist events.
pub async fn events_handler(
    State(ctx): State<AppContext>,
    Query(params): Query<EventsQuery>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let room = params.room.filter(|r| !r.trim().is_empty());

    // Subscribe before snapshotting so nothing falls in between.
    let mut rx = ctx.event_bus.subscribe();
    let recent = ctx.event_bus.recent_events(REPLAY_EVENTS, room.as_deref());
    let replayed: Vec<_> = recent.iter().map(|e| e.id).collect();
    let mut shutdown = ctx.shutdown_receiver();

    tracing::debug!(room = ?room, replay = recent.len(), "SSE client connected");

    let stream = async_stream::stream! {
        // Oldest first.
        for event in recent.iter().rev() {
            if let Some(sse) = to_sse(event) {
                yield Ok(sse);
            }
        }

        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // The first tick completes immediately.
        heartbeat.tick().await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let wanted = event.matches_room(room.as_deref())
                                && !replayed.contains(&event.id);
                            if wanted {
                                if let Some(sse) = to_sse(&event) {
                                    yield Ok(sse);
                                }
                            }
                        }
                        Err(RecvError::Lagged(n)) => {
                            tracing::debug!("SSE client lagged by {n} events");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                _ = heartbeat.tick() => {
                    yield Ok(Event::default()
                        .event("heartbeat")
                        .data(r#"{"type":"heartbeat"}"#));
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("ping"))
}
