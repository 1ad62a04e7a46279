//! Report export command.

use chrono::Utc;

use super::state::AppState;
use crate::db;
use crate::export::{self, ReportMeta};

/// Renders the course report and writes it to the exports directory.
/// Returns the written path.
pub fn export_course_report(state: &AppState, meta: ReportMeta) -> Result<String, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let courses = {
        let conn = state.db().map_err(|e| e.to_string())?;
        db::list_medication_courses(&conn, &user_id).map_err(|e| e.to_string())?
    };

    let now = Utc::now();
    let bytes = export::generate_course_report_pdf(&courses, &meta, now).map_err(|e| e.to_string())?;
    let path = export::export_pdf_to_file(&bytes, &export::report_filename(now), &state.exports_dir)
        .map_err(|e| e.to_string())?;
    Ok(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiaryConfig;
    use uuid::Uuid;

    #[test]
    fn writes_report_into_exports_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(DiaryConfig::default())
            .unwrap()
            .with_exports_dir(tmp.path().join("exports"));
        state.sign_in(Uuid::new_v4()).unwrap();

        let path = export_course_report(&state, ReportMeta::default()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }
}
