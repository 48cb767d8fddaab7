//! Live room state for synchronized playback.
//!
//! A [`RoomRegistry`] tracks who is connected to each room, which of them
//! may drive the shared player, and where that player is. Each connection
//! hands the registry an [`Outbox`]; everything addressed to that client is
//! pushed there in order and the connection task writes it to the socket.
//!
//! Rooms exist only while someone is connected. The first client in a room
//! becomes its host; when the last host leaves, the longest-connected
//! remaining client is promoted.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::ids::{ClientId, VideoId};

/// Per-client delivery channel.
pub type Outbox = mpsc::UnboundedSender<RoomMessage>;

/// Wire `type` of a [`RoomMessage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Tells a client its own id and whether it is a host.
    Identity,
    /// Player position sent to a client as it joins.
    SyncState,
    UserList,
    System,
    Error,

    Play,
    Pause,
    Seek,
    ChangeVideo,

    GrantControl,
    RevokeControl,

    Chat,
    Typing,
    Reaction,
    RequestControl,
    NewVideo,

    #[default]
    #[serde(other)]
    Unknown,
}

/// One entry of a `user_list` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: ClientId,
    pub username: String,
    pub is_host: bool,
}

/// A message on a room connection, in either direction.
///
/// Fields a message kind does not use are left empty and skipped on the
/// wire. The registry overwrites `room`, `user_id`, `username` and
/// `is_host` on anything a client sends, so those cannot be spoofed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Player position in seconds.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_list: Option<Vec<UserSummary>>,
}

impl RoomMessage {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Server notice shown to everyone in the room.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(MessageKind::System)
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(MessageKind::Error)
        }
    }

    fn identity(id: ClientId, is_host: bool) -> Self {
        Self {
            user_id: Some(id),
            is_host,
            ..Self::new(MessageKind::Identity)
        }
    }
}

/// Where a room's player is right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub video_id: Option<VideoId>,
    /// Seconds, including time elapsed since the last play.
    pub position: f64,
    pub playing: bool,
}

/// A room with at least one connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRoom {
    pub name: String,
    /// Connected clients.
    pub count: usize,
}

struct Member {
    id: ClientId,
    username: String,
    is_host: bool,
    outbox: Outbox,
}

struct Room {
    video_id: Option<VideoId>,
    timestamp: f64,
    playing: bool,
    last_updated: Instant,
    // Join order; the front is promoted first.
    members: Vec<Member>,
}

impl Room {
    fn new(now: Instant) -> Self {
        Self {
            video_id: None,
            timestamp: 0.0,
            playing: false,
            last_updated: now,
            members: Vec::new(),
        }
    }

    fn position(&self, now: Instant) -> f64 {
        if self.playing {
            self.timestamp + now.saturating_duration_since(self.last_updated).as_secs_f64()
        } else {
            self.timestamp
        }
    }

    fn member(&self, id: ClientId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    fn member_mut(&mut self, id: ClientId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    fn host_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_host).count()
    }

    fn send_all(&self, msg: &RoomMessage) {
        for member in &self.members {
            // A closed outbox means the connection is already on its way out.
            let _ = member.outbox.send(msg.clone());
        }
    }

    fn user_list(&self) -> RoomMessage {
        let users = self
            .members
            .iter()
            .map(|m| UserSummary {
                id: m.id,
                username: m.username.clone(),
                is_host: m.is_host,
            })
            .collect();
        RoomMessage {
            user_list: Some(users),
            ..RoomMessage::new(MessageKind::UserList)
        }
    }

    fn apply_playback(&mut self, kind: MessageKind, timestamp: f64, now: Instant) {
        match kind {
            MessageKind::Play => self.playing = true,
            MessageKind::Pause => self.playing = false,
            _ => {}
        }
        self.timestamp = timestamp;
        self.last_updated = now;
    }
}

/// Player positions arrive from clients; anything odd counts as the start.
fn clamp_position(timestamp: f64) -> f64 {
    if timestamp.is_finite() && timestamp > 0.0 {
        timestamp
    } else {
        0.0
    }
}

/// All live rooms, keyed by name.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client to `room`, creating the room if needed.
    ///
    /// The client receives `identity` then `sync_state`; everyone in the
    /// room, the newcomer included, then receives the updated `user_list`.
    pub fn join(&self, room: &str, username: &str, outbox: Outbox) -> ClientId {
        let id = ClientId::new();
        let now = Instant::now();
        let mut rooms = self.rooms.lock();
        let state = rooms
            .entry(room.to_string())
            .or_insert_with(|| Room::new(now));

        let is_host = state.members.is_empty();
        let _ = outbox.send(RoomMessage::identity(id, is_host));
        let _ = outbox.send(RoomMessage {
            timestamp: state.position(now),
            content: if state.playing { "playing" } else { "paused" }.into(),
            video_id: state.video_id,
            ..RoomMessage::new(MessageKind::SyncState)
        });

        state.members.push(Member {
            id,
            username: username.to_string(),
            is_host,
            outbox,
        });
        state.send_all(&state.user_list());

        tracing::info!(room, username, client = %id, is_host, "Client joined room");
        id
    }

    /// Apply a message sent by `client` and fan out whatever it causes.
    ///
    /// Playback, video changes and host management are accepted from hosts
    /// only; from anyone else they are dropped. Server-only kinds are
    /// ignored.
    pub fn dispatch(&self, room: &str, client: ClientId, mut msg: RoomMessage) {
        let now = Instant::now();
        let mut rooms = self.rooms.lock();
        let Some(state) = rooms.get_mut(room) else {
            return;
        };
        let Some(sender) = state.member(client) else {
            return;
        };
        let sender_is_host = sender.is_host;

        msg.room = room.to_string();
        msg.user_id = Some(client);
        msg.username = sender.username.clone();
        msg.is_host = sender_is_host;
        msg.user_list = None;

        match msg.kind {
            MessageKind::Play | MessageKind::Pause | MessageKind::Seek
            | MessageKind::ChangeVideo
            | MessageKind::GrantControl
            | MessageKind::RevokeControl
                if !sender_is_host =>
            {
                tracing::debug!(room, client = %client, kind = ?msg.kind, "Ignoring command from non-host");
            }
            MessageKind::Play | MessageKind::Pause | MessageKind::Seek => {
                msg.timestamp = clamp_position(msg.timestamp);
                state.apply_playback(msg.kind, msg.timestamp, now);
                state.send_all(&msg);
            }
            MessageKind::ChangeVideo => {
                state.video_id = msg.video_id;
                state.apply_playback(MessageKind::Pause, 0.0, now);
                msg.timestamp = 0.0;
                state.send_all(&msg);
            }
            MessageKind::GrantControl | MessageKind::RevokeControl => {
                let grant = msg.kind == MessageKind::GrantControl;
                let Ok(target) = msg.content.trim().parse::<ClientId>() else {
                    tracing::debug!(room, target = %msg.content, "Control change for malformed client id");
                    return;
                };

                let target_is_host = state.member(target).is_some_and(|m| m.is_host);
                if !grant && target_is_host && state.host_count() == 1 {
                    if let Some(sender) = state.member(client) {
                        let _ = sender
                            .outbox
                            .send(RoomMessage::error("A room needs at least one host."));
                    }
                    return;
                }

                let Some(member) = state.member_mut(target) else {
                    return;
                };
                member.is_host = grant;
                let _ = member.outbox.send(RoomMessage::identity(target, grant));
                tracing::info!(room, client = %target, is_host = grant, "Host status changed");
                state.send_all(&state.user_list());
            }
            MessageKind::Chat
            | MessageKind::Typing
            | MessageKind::Reaction
            | MessageKind::RequestControl
            | MessageKind::NewVideo => state.send_all(&msg),
            MessageKind::Identity
            | MessageKind::SyncState
            | MessageKind::UserList
            | MessageKind::System
            | MessageKind::Error
            | MessageKind::Unknown => {
                tracing::debug!(room, client = %client, kind = ?msg.kind, "Ignoring client message");
            }
        }
    }

    /// Remove a client. The player position is carried forward, a new host
    /// is promoted if the room lost its last one, and an empty room is
    /// dropped.
    pub fn leave(&self, room: &str, client: ClientId) {
        let now = Instant::now();
        let mut rooms = self.rooms.lock();
        let Some(state) = rooms.get_mut(room) else {
            return;
        };
        let Some(idx) = state.members.iter().position(|m| m.id == client) else {
            return;
        };

        if state.playing {
            state.timestamp = state.position(now);
            state.last_updated = now;
        }
        let leaving = state.members.remove(idx);
        tracing::info!(room, client = %client, username = %leaving.username, "Client left room");

        if state.members.is_empty() {
            rooms.remove(room);
            tracing::debug!(room, "Room closed");
            return;
        }

        if leaving.is_host && state.host_count() == 0 {
            let heir = &mut state.members[0];
            heir.is_host = true;
            let _ = heir.outbox.send(RoomMessage::identity(heir.id, true));
            let notice = RoomMessage::system(format!("{} is now the Host.", heir.username));
            tracing::info!(room, client = %heir.id, "Promoted new host");
            state.send_all(&notice);
        }
        state.send_all(&state.user_list());
    }

    /// Rooms with connected clients, ordered by name.
    pub fn active_rooms(&self) -> Vec<ActiveRoom> {
        let rooms = self.rooms.lock();
        let mut active: Vec<ActiveRoom> = rooms
            .iter()
            .map(|(name, room)| ActiveRoom {
                name: name.clone(),
                count: room.members.len(),
            })
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }

    pub fn playback(&self, room: &str) -> Option<Playback> {
        let rooms = self.rooms.lock();
        rooms.get(room).map(|r| Playback {
            video_id: r.video_id,
            position: r.position(Instant::now()),
            playing: r.playing,
        })
    }

    pub fn members(&self, room: &str) -> Vec<UserSummary> {
        let rooms = self.rooms.lock();
        rooms
            .get(room)
            .and_then(|r| r.user_list().user_list)
            .unwrap_or_default()
    }

    /// Pretend the room's clock was last touched `by` earlier.
    #[cfg(test)]
    fn backdate(&self, room: &str, by: std::time::Duration) {
        if let Some(r) = self.rooms.lock().get_mut(room) {
            r.last_updated = r.last_updated.checked_sub(by).unwrap();
        }
    }
}
