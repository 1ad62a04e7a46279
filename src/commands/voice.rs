//! Voice capture command: parse a final transcript against the user's
//! known medication names.

use chrono::Utc;

use super::state::AppState;
use crate::db;
use crate::voice::{self, FinalTranscript, VoiceParseResult};

pub fn parse_voice_transcript(
    state: &AppState,
    transcript: FinalTranscript,
) -> Result<VoiceParseResult, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    let known = db::known_medication_names(&conn, &user_id).map_err(|e| e.to_string())?;

    let today = Utc::now()
        .with_timezone(&state.config.reference_zone)
        .date_naive();
    let result = voice::parse_utterance(&transcript.text, &known, today);
    tracing::debug!(
        recognizer_confidence = transcript.confidence,
        name_confidence = result.name_confidence,
        "Parsed voice transcript"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiaryConfig;
    use crate::voice::NameSource;
    use crate::wizard::CourseWizard;
    use uuid::Uuid;

    #[test]
    fn known_course_names_resolve_exactly() {
        let state = AppState::in_memory(DiaryConfig::default()).unwrap();
        state.sign_in(Uuid::new_v4()).unwrap();

        let mut wizard = CourseWizard::new();
        wizard.open_create();
        wizard.draft_mut().medication_name = "Amitriptylin".into();
        while wizard.next().is_ok() {}
        let submission = wizard.submit(Uuid::nil(), Utc::now()).unwrap();
        crate::commands::courses::save_course(&state, submission).unwrap();

        let result = parse_voice_transcript(
            &state,
            FinalTranscript::new("Amitriptylin 25 mg abends", 0.9),
        )
        .unwrap();
        assert_eq!(result.medication_name.as_deref(), Some("Amitriptylin"));
        assert_eq!(result.name_source, NameSource::Exact);
    }
}
