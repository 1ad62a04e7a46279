use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded headache episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// 0-10 pain scale.
    pub intensity: u8,
    pub has_aura: bool,
    pub location: Option<String>,
    pub medications: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Free-text context captured alongside the pain entries (often by voice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Tombstone; set notes are hidden from every read.
    pub deleted_at: Option<DateTime<Utc>>,
}
