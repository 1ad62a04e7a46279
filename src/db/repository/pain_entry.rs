use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_instant, parse_instant, FetchedPage};
use crate::db::DatabaseError;
use crate::models::PainEntry;

pub fn insert_pain_entry(conn: &Connection, entry: &PainEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO pain_entries (id, user_id, started_at, intensity, has_aura, location,
         medications, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.id.to_string(),
            entry.user_id.to_string(),
            format_instant(&entry.started_at),
            entry.intensity as i32,
            entry.has_aura as i32,
            entry.location,
            serde_json::to_string(&entry.medications)?,
            entry.notes,
            format_instant(&entry.created_at),
        ],
    )?;
    Ok(())
}

/// One page of pain entries, most recent first. `page` is zero-based.
pub fn fetch_pain_entries_page(
    conn: &Connection,
    user_id: &Uuid,
    page: u32,
    page_size: u32,
) -> Result<FetchedPage<PainEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, started_at, intensity, has_aura, location, medications, notes, created_at
         FROM pain_entries WHERE user_id = ?1
         ORDER BY started_at DESC, created_at DESC
         LIMIT ?2 OFFSET ?3",
    )?;

    let rows = stmt.query_map(
        params![user_id.to_string(), page_size, page * page_size],
        |row| {
            Ok(PainEntryRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                started_at: row.get(2)?,
                intensity: row.get(3)?,
                has_aura: row.get(4)?,
                location: row.get(5)?,
                medications: row.get(6)?,
                notes: row.get(7)?,
                created_at: row.get(8)?,
            })
        },
    )?;

    let mut entries = Vec::new();
    let mut scanned = 0;
    for row in rows {
        let raw = row?;
        scanned += 1;
        let id = raw.id.clone();
        match pain_entry_from_row(raw) {
            Some(entry) => entries.push(entry),
            None => tracing::warn!(entry_id = %id, "Skipping malformed pain entry"),
        }
    }
    Ok(FetchedPage { rows: entries, scanned })
}

pub fn count_pain_entries(conn: &Connection, user_id: &Uuid) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM pain_entries WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

pub fn delete_pain_entry(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM pain_entries WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "PainEntry".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct PainEntryRow {
    id: String,
    user_id: String,
    started_at: String,
    intensity: i32,
    has_aura: i32,
    location: Option<String>,
    medications: String,
    notes: Option<String>,
    created_at: String,
}

fn pain_entry_from_row(row: PainEntryRow) -> Option<PainEntry> {
    Some(PainEntry {
        id: Uuid::parse_str(&row.id).ok()?,
        user_id: Uuid::parse_str(&row.user_id).ok()?,
        started_at: parse_instant(&row.started_at)?,
        intensity: u8::try_from(row.intensity).ok()?,
        has_aura: row.has_aura != 0,
        location: row.location,
        medications: serde_json::from_str(&row.medications).unwrap_or_default(),
        notes: row.notes,
        created_at: parse_instant(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{Duration, TimeZone, Utc};

    fn make_entry(user_id: Uuid, day: u32, intensity: u8) -> PainEntry {
        let started = Utc.with_ymd_and_hms(2026, 2, day, 7, 30, 0).unwrap();
        PainEntry {
            id: Uuid::new_v4(),
            user_id,
            started_at: started,
            intensity,
            has_aura: false,
            location: Some("left temple".into()),
            medications: vec!["Sumatriptan".into()],
            notes: None,
            created_at: started + Duration::minutes(5),
        }
    }

    #[test]
    fn pages_are_most_recent_first() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        for day in 1..=5 {
            insert_pain_entry(&conn, &make_entry(user, day, 5)).unwrap();
        }

        let first = fetch_pain_entries_page(&conn, &user, 0, 2).unwrap().rows;
        let second = fetch_pain_entries_page(&conn, &user, 1, 2).unwrap().rows;
        let third = fetch_pain_entries_page(&conn, &user, 2, 2).unwrap().rows;

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].started_at.format("%d").to_string(), "05");
        assert_eq!(second[0].started_at.format("%d").to_string(), "03");
        assert_eq!(third.len(), 1);
        assert_eq!(count_pain_entries(&conn, &user).unwrap(), 5);
    }

    #[test]
    fn malformed_row_is_skipped_but_scanned() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        insert_pain_entry(&conn, &make_entry(user, 1, 5)).unwrap();
        conn.execute(
            "INSERT INTO pain_entries (id, user_id, started_at, intensity, created_at)
             VALUES (?1, ?2, 'not-a-date', 3, 'not-a-date')",
            params![Uuid::new_v4().to_string(), user.to_string()],
        )
        .unwrap();

        let page = fetch_pain_entries_page(&conn, &user, 0, 10).unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.scanned, 2);
    }

    #[test]
    fn entries_are_user_scoped() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        insert_pain_entry(&conn, &make_entry(user, 1, 3)).unwrap();
        let other = Uuid::new_v4();
        assert!(fetch_pain_entries_page(&conn, &other, 0, 10).unwrap().rows.is_empty());
        assert_eq!(count_pain_entries(&conn, &other).unwrap(), 0);
    }

    #[test]
    fn intensity_above_ten_is_rejected_by_schema() {
        let conn = open_memory_database().unwrap();
        let entry = make_entry(Uuid::new_v4(), 1, 11);
        assert!(insert_pain_entry(&conn, &entry).is_err());
    }

    #[test]
    fn delete_entry() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let entry = make_entry(user, 1, 3);
        insert_pain_entry(&conn, &entry).unwrap();
        delete_pain_entry(&conn, &user, &entry.id).unwrap();
        assert!(matches!(
            delete_pain_entry(&conn, &user, &entry.id),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
