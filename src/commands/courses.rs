//! Medication-course commands.

use uuid::Uuid;

use super::state::AppState;
use crate::db;
use crate::models::MedicationCourse;
use crate::validation::{validate_effectiveness, ValidationError};
use crate::wizard::CourseSubmission;

pub fn list_courses(state: &AppState) -> Result<Vec<MedicationCourse>, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    db::list_medication_courses(&conn, &user_id).map_err(|e| e.to_string())
}

pub fn get_course(state: &AppState, course_id: String) -> Result<MedicationCourse, String> {
    let id = Uuid::parse_str(&course_id).map_err(|e| format!("Invalid course ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    db::get_medication_course(&conn, &user_id, &id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Medication course not found: {id}"))
}

/// Persists a wizard submission for the signed-in user.
pub fn save_course(
    state: &AppState,
    submission: CourseSubmission,
) -> Result<MedicationCourse, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;

    let mut course = submission.course().clone();
    course.user_id = user_id;
    if course.medication_name.trim().is_empty() {
        return Err(ValidationError::EmptyMedicationName.to_string());
    }
    validate_effectiveness(course.effectiveness).map_err(|e| e.to_string())?;

    let conn = state.db().map_err(|e| e.to_string())?;
    match submission {
        CourseSubmission::Create(_) => db::insert_medication_course(&conn, &course),
        CourseSubmission::Update(_) => db::update_medication_course(&conn, &course),
    }
    .map_err(|e| e.to_string())?;
    Ok(course)
}

pub fn delete_course(state: &AppState, course_id: String) -> Result<(), String> {
    let id = Uuid::parse_str(&course_id).map_err(|e| format!("Invalid course ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    db::delete_medication_course(&conn, &user_id, &id).map_err(|e| e.to_string())
}
