//! HTTP handlers for the chat service.

pub mod chat;
pub mod health;
pub mod info;

pub use chat::chat;
pub use health::{health_check, readiness_check};
pub use info::{index, metrics, not_found};
