//! Playlist event system for SSE broadcasting.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel with a bounded
//! ring-buffer of recent events so that clients joining a room late can
//! catch up on what was added.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;

use crate::ids::{EventId, VideoId};

/// Maximum number of events retained in the ring buffer.
const MAX_RECENT_EVENTS: usize = 100;

/// Payload describing what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A video was appended to a room's playlist.
    VideoAdded { video_id: VideoId, title: String },
}

impl EventPayload {
    /// Name used for the SSE `event:` field.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::VideoAdded { .. } => "video_added",
        }
    }
}

/// A timestamped, room-scoped event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    /// Room the event belongs to.
    pub room: String,
    pub payload: EventPayload,
}

impl Event {
    /// Create a new event with a fresh id and the current timestamp.
    pub fn new(room: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            room: room.into(),
            payload,
        }
    }

    /// Whether this event should be delivered to a subscriber filtering on
    /// `room`. `None` means "every room".
    pub fn matches_room(&self, room: Option<&str>) -> bool {
        room.map_or(true, |r| self.room == r)
    }
}

/// Broadcast channel with a bounded ring buffer of recent events.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    recent: RwLock<VecDeque<Event>>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` controls the broadcast channel buffer size (not the ring
    /// buffer, which is always [`MAX_RECENT_EVENTS`]).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(MAX_RECENT_EVENTS)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Broadcast an event for `room` and store it in the ring buffer.
    ///
    /// Returns the event that was sent.
    pub fn broadcast(&self, room: &str, payload: EventPayload) -> Event {
        let event = Event::new(room, payload);

        {
            let mut recent = self.recent.write();
            if recent.len() >= MAX_RECENT_EVENTS {
                recent.pop_back();
            }
            recent.push_front(event.clone());
        }

        // No subscribers is fine.
        let _ = self.tx.send(event.clone());
        event
    }

    /// Return up to `n` recent events (newest first), optionally limited to
    /// one room.
    pub fn recent_events(&self, n: usize, room: Option<&str>) -> Vec<Event> {
        let recent = self.recent.read();
        recent
            .iter()
            .filter(|e| e.matches_room(room))
            .take(n)
            .cloned()
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
