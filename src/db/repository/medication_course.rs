use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_instant, parse_date, parse_instant};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const COURSE_COLUMNS: &str = "id, user_id, medication_name, course_type, dose_text, start_date,
     end_date, is_active, baseline_days_min, baseline_days_max, baseline_impairment, effectiveness,
     has_side_effects, side_effects, discontinuation_reason, discontinuation_details,
     physician_note, created_at, updated_at";

pub fn insert_medication_course(
    conn: &Connection,
    course: &MedicationCourse,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medication_courses (id, user_id, medication_name, course_type, dose_text,
         start_date, end_date, is_active, baseline_days_min, baseline_days_max, baseline_impairment,
         effectiveness, has_side_effects, side_effects, discontinuation_reason,
         discontinuation_details, physician_note, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            course.id.to_string(),
            course.user_id.to_string(),
            course.medication_name,
            course.course_type.as_str(),
            course.dose_text,
            course.start_date.map(|d| d.to_string()),
            course.end_date.map(|d| d.to_string()),
            course.is_active as i32,
            course.baseline.days_with_symptom_min,
            course.baseline.days_with_symptom_max,
            course.baseline.impairment.map(|i| i.as_str()),
            course.effectiveness,
            course.has_side_effects as i32,
            course.side_effects,
            course.discontinuation_reason.map(|r| r.as_str()),
            course.discontinuation_details,
            course.physician_note,
            format_instant(&course.created_at),
            format_instant(&course.updated_at),
        ],
    )?;
    tracing::info!(course_id = %course.id, "Medication course created");
    Ok(())
}

pub fn update_medication_course(
    conn: &Connection,
    course: &MedicationCourse,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_courses SET medication_name = ?3, course_type = ?4, dose_text = ?5,
         start_date = ?6, end_date = ?7, is_active = ?8, baseline_days_min = ?9,
         baseline_days_max = ?10, baseline_impairment = ?11, effectiveness = ?12,
         has_side_effects = ?13, side_effects = ?14, discontinuation_reason = ?15,
         discontinuation_details = ?16, physician_note = ?17, updated_at = ?18
         WHERE id = ?1 AND user_id = ?2",
        params![
            course.id.to_string(),
            course.user_id.to_string(),
            course.medication_name,
            course.course_type.as_str(),
            course.dose_text,
            course.start_date.map(|d| d.to_string()),
            course.end_date.map(|d| d.to_string()),
            course.is_active as i32,
            course.baseline.days_with_symptom_min,
            course.baseline.days_with_symptom_max,
            course.baseline.impairment.map(|i| i.as_str()),
            course.effectiveness,
            course.has_side_effects as i32,
            course.side_effects,
            course.discontinuation_reason.map(|r| r.as_str()),
            course.discontinuation_details,
            course.physician_note,
            format_instant(&course.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(not_found(&course.id));
    }
    tracing::info!(course_id = %course.id, "Medication course updated");
    Ok(())
}

pub fn get_medication_course(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<Option<MedicationCourse>, DatabaseError> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM medication_courses WHERE user_id = ?1 AND id = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![user_id.to_string(), id.to_string()], |row| {
        Ok(course_row_from_rusqlite(row))
    })?;

    match rows.next() {
        Some(row) => Ok(Some(course_from_row(row??)?)),
        None => Ok(None),
    }
}

/// Active courses first, then by start date, most recent first.
pub fn list_medication_courses(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<MedicationCourse>, DatabaseError> {
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM medication_courses WHERE user_id = ?1
         ORDER BY is_active DESC, start_date IS NULL, start_date DESC, created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok(course_row_from_rusqlite(row))
    })?;

    let mut courses = Vec::new();
    for row in rows {
        courses.push(course_from_row(row??)?);
    }
    Ok(courses)
}

pub fn delete_medication_course(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medication_courses WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Distinct medication names the user has recorded, for voice matching.
pub fn known_medication_names(conn: &Connection, user_id: &Uuid) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT medication_name FROM medication_courses
         WHERE user_id = ?1 ORDER BY medication_name",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "MedicationCourse".into(),
        id: id.to_string(),
    }
}

struct CourseRow {
    id: String,
    user_id: String,
    medication_name: String,
    course_type: String,
    dose_text: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    is_active: i32,
    baseline_days_min: Option<u8>,
    baseline_days_max: Option<u8>,
    baseline_impairment: Option<String>,
    effectiveness: Option<u8>,
    has_side_effects: i32,
    side_effects: Option<String>,
    discontinuation_reason: Option<String>,
    discontinuation_details: Option<String>,
    physician_note: Option<String>,
    created_at: String,
    updated_at: String,
}

fn course_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<CourseRow, rusqlite::Error> {
    Ok(CourseRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        medication_name: row.get(2)?,
        course_type: row.get(3)?,
        dose_text: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        is_active: row.get(7)?,
        baseline_days_min: row.get(8)?,
        baseline_days_max: row.get(9)?,
        baseline_impairment: row.get(10)?,
        effectiveness: row.get(11)?,
        has_side_effects: row.get(12)?,
        side_effects: row.get(13)?,
        discontinuation_reason: row.get(14)?,
        discontinuation_details: row.get(15)?,
        physician_note: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn course_from_row(row: CourseRow) -> Result<MedicationCourse, DatabaseError> {
    let bad_instant = |raw: &str| DatabaseError::MalformedRow(format!("Invalid instant: {raw}"));
    Ok(MedicationCourse {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::MalformedRow(e.to_string()))?,
        user_id: Uuid::parse_str(&row.user_id)
            .map_err(|e| DatabaseError::MalformedRow(e.to_string()))?,
        medication_name: row.medication_name,
        course_type: CourseType::from_str(&row.course_type)?,
        dose_text: row.dose_text,
        start_date: parse_date(row.start_date),
        end_date: parse_date(row.end_date),
        is_active: row.is_active != 0,
        baseline: BaselineSeverity {
            days_with_symptom_min: row.baseline_days_min,
            days_with_symptom_max: row.baseline_days_max,
            impairment: row
                .baseline_impairment
                .as_deref()
                .map(ImpairmentLevel::from_str)
                .transpose()?,
        },
        effectiveness: row.effectiveness,
        has_side_effects: row.has_side_effects != 0,
        side_effects: row.side_effects,
        discontinuation_reason: row
            .discontinuation_reason
            .as_deref()
            .map(DiscontinuationReason::from_str)
            .transpose()?,
        discontinuation_details: row.discontinuation_details,
        physician_note: row.physician_note,
        created_at: parse_instant(&row.created_at).ok_or_else(|| bad_instant(&row.created_at))?,
        updated_at: parse_instant(&row.updated_at).ok_or_else(|| bad_instant(&row.updated_at))?,
    })
}
