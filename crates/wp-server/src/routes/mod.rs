//! Route handlers for the HTTP API.

pub mod auth;
pub mod events;
pub mod health;
pub mod rooms;
pub mod videos;
pub mod ws;
