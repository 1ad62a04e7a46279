//! Command boundary used by the app shell.
//!
//! Every command resolves the signed-in user from `AppState`, delegates to
//! the engines and repositories, and converts failures into user-facing
//! messages.

pub mod courses;
pub mod export;
pub mod journal;
pub mod reminders;
pub mod state;
pub mod timeline;
pub mod voice;

pub use state::{AppState, StateError};

/// Health check command, verifies the core is reachable.
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}
