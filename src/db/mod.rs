//! SQLite persistence for the diary: connection setup, migrations and the
//! per-entity repositories.

pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity_type} {id} does not exist")]
    NotFound { entity_type: String, id: String },

    #[error("Unknown {field} value in store: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration {version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Stored row is malformed: {0}")]
    MalformedRow(String),

    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),
}
