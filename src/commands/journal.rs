//! Journal commands: pain entries and context notes.

use chrono::Utc;
use uuid::Uuid;

use super::state::AppState;
use crate::journal::{self, ContextNoteInput, PainEntryInput};
use crate::models::{ContextNote, PainEntry};

pub fn record_pain_entry(state: &AppState, input: PainEntryInput) -> Result<PainEntry, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    journal::record_pain_entry(&conn, &user_id, input, Utc::now()).map_err(|e| e.to_string())
}

pub fn add_context_note(state: &AppState, input: ContextNoteInput) -> Result<ContextNote, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    journal::add_context_note(&conn, &user_id, input, Utc::now()).map_err(|e| e.to_string())
}

pub fn delete_context_note(state: &AppState, note_id: String) -> Result<(), String> {
    let id = Uuid::parse_str(&note_id).map_err(|e| format!("Invalid note ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    journal::delete_context_note(&conn, &user_id, &id, Utc::now()).map_err(|e| e.to_string())
}

pub fn delete_pain_entry(state: &AppState, entry_id: String) -> Result<(), String> {
    let id = Uuid::parse_str(&entry_id).map_err(|e| format!("Invalid entry ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    journal::delete_pain_entry(&conn, &user_id, &id).map_err(|e| e.to_string())
}
