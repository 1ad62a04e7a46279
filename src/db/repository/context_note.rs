use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_instant, parse_instant, FetchedPage};
use crate::db::DatabaseError;
use crate::models::ContextNote;

pub fn insert_context_note(conn: &Connection, note: &ContextNote) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO context_notes (id, user_id, text, occurred_at, created_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            note.id.to_string(),
            note.user_id.to_string(),
            note.text,
            format_instant(&note.occurred_at),
            format_instant(&note.created_at),
            note.deleted_at.as_ref().map(format_instant),
        ],
    )?;
    Ok(())
}

/// One page of live (not tombstoned) notes, most recent first.
pub fn fetch_context_notes_page(
    conn: &Connection,
    user_id: &Uuid,
    page: u32,
    page_size: u32,
) -> Result<FetchedPage<ContextNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, text, occurred_at, created_at, deleted_at
         FROM context_notes WHERE user_id = ?1 AND deleted_at IS NULL
         ORDER BY occurred_at DESC, created_at DESC
         LIMIT ?2 OFFSET ?3",
    )?;

    let rows = stmt.query_map(
        params![user_id.to_string(), page_size, page * page_size],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        },
    )?;

    let mut notes = Vec::new();
    let mut scanned = 0;
    for row in rows {
        let (id, user, text, occurred_at, created_at, deleted_at) = row?;
        scanned += 1;
        let parsed = (|| {
            Some(ContextNote {
                id: Uuid::parse_str(&id).ok()?,
                user_id: Uuid::parse_str(&user).ok()?,
                text,
                occurred_at: parse_instant(&occurred_at)?,
                created_at: parse_instant(&created_at)?,
                deleted_at: deleted_at.as_deref().and_then(parse_instant),
            })
        })();
        match parsed {
            Some(note) => notes.push(note),
            None => tracing::warn!(note_id = %id, "Skipping malformed context note"),
        }
    }
    Ok(FetchedPage { rows: notes, scanned })
}

/// Number of live notes.
pub fn count_context_notes(conn: &Connection, user_id: &Uuid) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM context_notes WHERE user_id = ?1 AND deleted_at IS NULL",
        params![user_id.to_string()],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

/// Sets the tombstone. Deleting an already deleted note is `NotFound`.
pub fn soft_delete_context_note(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE context_notes SET deleted_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
        params![format_instant(&at), id.to_string(), user_id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ContextNote".into(),
            id: id.to_string(),
        });
    }
    tracing::info!(note_id = %id, "Context note tombstoned");
    Ok(())
}
