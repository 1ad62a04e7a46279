use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_instant, parse_instant};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const REMINDER_COLUMNS: &str = "id, user_id, reminder_type, title, date_time, repeat_rule, notes,
     notification_enabled, status, medications, time_of_day, series_id, follow_up_enabled,
     follow_up_interval_value, follow_up_interval_unit, follow_up_next_date, notify_offsets_minutes";

pub fn insert_reminder(conn: &Connection, reminder: &Reminder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (id, user_id, reminder_type, title, date_time, repeat_rule, notes,
         notification_enabled, status, medications, time_of_day, series_id, follow_up_enabled,
         follow_up_interval_value, follow_up_interval_unit, follow_up_next_date, notify_offsets_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            reminder.id.to_string(),
            reminder.user_id.to_string(),
            reminder.reminder_type.as_str(),
            reminder.title,
            reminder.date_time.as_ref().map(format_instant),
            reminder.repeat.as_str(),
            reminder.notes,
            reminder.notification_enabled as i32,
            reminder.status.as_str(),
            serde_json::to_string(&reminder.medications)?,
            reminder.time_of_day.map(|t| t.as_str()),
            reminder.series_id.map(|id| id.to_string()),
            reminder.follow_up.enabled as i32,
            reminder.follow_up.interval_value,
            reminder.follow_up.interval_unit.map(|u| u.as_str()),
            reminder.follow_up.next_date.as_ref().map(format_instant),
            serde_json::to_string(&reminder.notify_offsets_minutes)?,
        ],
    )?;
    Ok(())
}

/// Inserts a batch (one reminder per selected time of day) all-or-nothing.
pub fn insert_reminders(conn: &Connection, reminders: &[Reminder]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for reminder in reminders {
        insert_reminder(&tx, reminder)?;
    }
    tx.commit()?;
    tracing::info!(count = reminders.len(), "Inserted reminder batch");
    Ok(())
}

pub fn get_reminder(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<Option<Reminder>, DatabaseError> {
    let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE user_id = ?1 AND id = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(
        params![user_id.to_string(), id.to_string()],
        |row| Ok(reminder_row_from_rusqlite(row)),
    )?;

    match rows.next() {
        Some(row) => Ok(Some(reminder_from_row(row??)?)),
        None => Ok(None),
    }
}

/// All reminders of a user ordered by trigger instant (unparsable instants last).
///
/// Rows that cannot be decoded are skipped with a warning so one bad record
/// never hides the rest of the list.
pub fn list_reminders(conn: &Connection, user_id: &Uuid) -> Result<Vec<Reminder>, DatabaseError> {
    let sql = format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders WHERE user_id = ?1
         ORDER BY date_time IS NULL, date_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok(reminder_row_from_rusqlite(row))
    })?;

    let mut reminders = Vec::new();
    for row in rows {
        let raw = row??;
        let id = raw.id.clone();
        match reminder_from_row(raw) {
            Ok(reminder) => reminders.push(reminder),
            Err(e) => tracing::warn!(reminder_id = %id, error = %e, "Skipping malformed reminder"),
        }
    }
    Ok(reminders)
}

/// Members of one series.
pub fn list_series(
    conn: &Connection,
    user_id: &Uuid,
    series_id: &Uuid,
) -> Result<Vec<Reminder>, DatabaseError> {
    Ok(list_reminders(conn, user_id)?
        .into_iter()
        .filter(|r| r.series_id.as_ref() == Some(series_id))
        .collect())
}

pub fn update_reminder(conn: &Connection, reminder: &Reminder) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE reminders SET reminder_type = ?3, title = ?4, date_time = ?5, repeat_rule = ?6,
         notes = ?7, notification_enabled = ?8, status = ?9, medications = ?10, time_of_day = ?11,
         series_id = ?12, follow_up_enabled = ?13, follow_up_interval_value = ?14,
         follow_up_interval_unit = ?15, follow_up_next_date = ?16, notify_offsets_minutes = ?17
         WHERE id = ?1 AND user_id = ?2",
        params![
            reminder.id.to_string(),
            reminder.user_id.to_string(),
            reminder.reminder_type.as_str(),
            reminder.title,
            reminder.date_time.as_ref().map(format_instant),
            reminder.repeat.as_str(),
            reminder.notes,
            reminder.notification_enabled as i32,
            reminder.status.as_str(),
            serde_json::to_string(&reminder.medications)?,
            reminder.time_of_day.map(|t| t.as_str()),
            reminder.series_id.map(|id| id.to_string()),
            reminder.follow_up.enabled as i32,
            reminder.follow_up.interval_value,
            reminder.follow_up.interval_unit.map(|u| u.as_str()),
            reminder.follow_up.next_date.as_ref().map(format_instant),
            serde_json::to_string(&reminder.notify_offsets_minutes)?,
        ],
    )?;
    if updated == 0 {
        return Err(not_found(&reminder.id));
    }
    Ok(())
}

pub fn delete_reminder(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM reminders WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Deletes every member of a series. Returns the number of removed rows.
pub fn delete_series(
    conn: &Connection,
    user_id: &Uuid,
    series_id: &Uuid,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM reminders WHERE series_id = ?1 AND user_id = ?2",
        params![series_id.to_string(), user_id.to_string()],
    )?;
    Ok(deleted)
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "Reminder".into(),
        id: id.to_string(),
    }
}

struct ReminderRow {
    id: String,
    user_id: String,
    reminder_type: String,
    title: String,
    date_time: Option<String>,
    repeat_rule: String,
    notes: Option<String>,
    notification_enabled: i32,
    status: String,
    medications: String,
    time_of_day: Option<String>,
    series_id: Option<String>,
    follow_up_enabled: i32,
    follow_up_interval_value: Option<u32>,
    follow_up_interval_unit: Option<String>,
    follow_up_next_date: Option<String>,
    notify_offsets_minutes: String,
}

fn reminder_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReminderRow, rusqlite::Error> {
    Ok(ReminderRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        reminder_type: row.get(2)?,
        title: row.get(3)?,
        date_time: row.get(4)?,
        repeat_rule: row.get(5)?,
        notes: row.get(6)?,
        notification_enabled: row.get(7)?,
        status: row.get(8)?,
        medications: row.get(9)?,
        time_of_day: row.get(10)?,
        series_id: row.get(11)?,
        follow_up_enabled: row.get(12)?,
        follow_up_interval_value: row.get(13)?,
        follow_up_interval_unit: row.get(14)?,
        follow_up_next_date: row.get(15)?,
        notify_offsets_minutes: row.get(16)?,
    })
}

fn reminder_from_row(row: ReminderRow) -> Result<Reminder, DatabaseError> {
    let date_time = row.date_time.as_deref().and_then(parse_instant);
    if date_time.is_none() {
        tracing::warn!(reminder_id = %row.id, raw = ?row.date_time, "Reminder has no usable date_time");
    }

    Ok(Reminder {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::MalformedRow(e.to_string()))?,
        user_id: Uuid::parse_str(&row.user_id)
            .map_err(|e| DatabaseError::MalformedRow(e.to_string()))?,
        reminder_type: ReminderType::from_str(&row.reminder_type)?,
        title: row.title,
        date_time,
        repeat: RepeatRule::from_str(&row.repeat_rule)?,
        notes: row.notes,
        notification_enabled: row.notification_enabled != 0,
        status: ReminderStatus::from_str(&row.status)?,
        medications: serde_json::from_str(&row.medications)?,
        time_of_day: row.time_of_day.as_deref().map(TimeOfDay::from_str).transpose()?,
        series_id: row.series_id.and_then(|s| Uuid::parse_str(&s).ok()),
        follow_up: FollowUp {
            enabled: row.follow_up_enabled != 0,
            interval_value: row.follow_up_interval_value,
            interval_unit: row
                .follow_up_interval_unit
                .as_deref()
                .map(FollowUpUnit::from_str)
                .transpose()?,
            next_date: row.follow_up_next_date.as_deref().and_then(parse_instant),
        },
        notify_offsets_minutes: serde_json::from_str(&row.notify_offsets_minutes)?,
    })
}
