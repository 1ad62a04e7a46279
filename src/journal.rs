//! Diary journal: recording pain entries and context notes.
//!
//! Inputs are validated before any store call, so a rejected entry never
//! reaches the database.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{ContextNote, PainEntry};
use crate::validation::{validate_intensity, validate_note_text, ValidationError};

#[derive(Error, Debug)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ═══════════════════════════════════════════
// Inputs
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PainEntryInput {
    pub started_at: DateTime<Utc>,
    pub intensity: u8,
    #[serde(default)]
    pub has_aura: bool,
    pub location: Option<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextNoteInput {
    pub text: String,
    /// Defaults to the time of recording.
    pub occurred_at: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ═══════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════

pub fn record_pain_entry(
    conn: &Connection,
    user_id: &Uuid,
    input: PainEntryInput,
    now: DateTime<Utc>,
) -> Result<PainEntry, JournalError> {
    validate_intensity(input.intensity)?;
    let notes = match non_blank(input.notes) {
        Some(text) => Some(validate_note_text(&text)?),
        None => None,
    };

    let entry = PainEntry {
        id: Uuid::new_v4(),
        user_id: *user_id,
        started_at: input.started_at,
        intensity: input.intensity,
        has_aura: input.has_aura,
        location: non_blank(input.location),
        medications: input
            .medications
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect(),
        notes,
        created_at: now,
    };
    db::insert_pain_entry(conn, &entry)?;
    tracing::info!(entry_id = %entry.id, intensity = entry.intensity, "Pain entry recorded");
    Ok(entry)
}

pub fn add_context_note(
    conn: &Connection,
    user_id: &Uuid,
    input: ContextNoteInput,
    now: DateTime<Utc>,
) -> Result<ContextNote, JournalError> {
    let text = validate_note_text(&input.text)?;
    let note = ContextNote {
        id: Uuid::new_v4(),
        user_id: *user_id,
        text,
        occurred_at: input.occurred_at.unwrap_or(now),
        created_at: now,
        deleted_at: None,
    };
    db::insert_context_note(conn, &note)?;
    tracing::info!(note_id = %note.id, chars = note.text.chars().count(), "Context note added");
    Ok(note)
}

/// Tombstones the note; it disappears from every later read.
pub fn delete_context_note(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
    now: DateTime<Utc>,
) -> Result<(), JournalError> {
    db::soft_delete_context_note(conn, user_id, id, now)?;
    Ok(())
}

pub fn delete_pain_entry(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<(), JournalError> {
    db::delete_pain_entry(conn, user_id, id)?;
    tracing::info!(entry_id = %id, "Pain entry deleted");
    Ok(())
}
