//! HTTP middleware: request ID and identity.

pub mod auth;
pub mod request_id;
