//! Four-step medication-course wizard.
//!
//! One draft spans all steps, so navigating back never loses input. Nothing
//! is persisted until `submit` hands out a complete `CourseSubmission`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::dosage::{decode, encode};
use crate::models::enums::{CourseType, DiscontinuationReason};
use crate::models::{BaselineSeverity, MedicationCourse, StructuredDosage};
use crate::validation::{validate_effectiveness, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Identity,
    TimeRange,
    Baseline,
    Outcome,
}

impl WizardStep {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Identity => Some(Self::TimeRange),
            Self::TimeRange => Some(Self::Baseline),
            Self::Baseline => Some(Self::Outcome),
            Self::Outcome => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Identity => None,
            Self::TimeRange => Some(Self::Identity),
            Self::Baseline => Some(Self::TimeRange),
            Self::Outcome => Some(Self::Baseline),
        }
    }

    /// 1-based position for the progress indicator.
    pub fn number(self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::TimeRange => 2,
            Self::Baseline => 3,
            Self::Outcome => 4,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Please enter a medication name")]
    MissingMedicationName,

    #[error("Already on the last step")]
    AlreadyAtLastStep,

    #[error("Submit is only possible from the last step (currently step {})", .0.number())]
    NotAtFinalStep(WizardStep),

    #[error("The wizard is not open")]
    NotOpen,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Every field the wizard collects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDraft {
    // Identity
    pub medication_name: String,
    pub course_type: CourseType,
    pub dosage: StructuredDosage,
    // Time range
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    // Baseline
    pub baseline: BaselineSeverity,
    // Outcome
    pub effectiveness: Option<u8>,
    pub has_side_effects: bool,
    pub side_effects: Option<String>,
    pub discontinuation_reason: Option<DiscontinuationReason>,
    pub discontinuation_details: Option<String>,
    pub physician_note: Option<String>,
}

impl Default for CourseDraft {
    fn default() -> Self {
        Self {
            medication_name: String::new(),
            course_type: CourseType::Prophylaxis,
            dosage: StructuredDosage::default(),
            is_active: true,
            start_date: None,
            end_date: None,
            baseline: BaselineSeverity::default(),
            effectiveness: None,
            has_side_effects: false,
            side_effects: None,
            discontinuation_reason: None,
            discontinuation_details: None,
            physician_note: None,
        }
    }
}

impl CourseDraft {
    /// Draft of an existing course; the stored dose text is decoded back
    /// into structured form.
    pub fn from_course(course: &MedicationCourse) -> Self {
        let dosage = course
            .dose_text
            .as_deref()
            .map(|text| decode(text).into_dosage())
            .unwrap_or_default();
        Self {
            medication_name: course.medication_name.clone(),
            course_type: course.course_type,
            dosage,
            is_active: course.is_active,
            start_date: course.start_date,
            end_date: course.end_date,
            baseline: course.baseline.clone(),
            effectiveness: course.effectiveness,
            has_side_effects: course.has_side_effects,
            side_effects: course.side_effects.clone(),
            discontinuation_reason: course.discontinuation_reason,
            discontinuation_details: course.discontinuation_details.clone(),
            physician_note: course.physician_note.clone(),
        }
    }

    fn dose_text(&self) -> Option<String> {
        (self.dosage != StructuredDosage::default()).then(|| encode(&self.dosage))
    }
}

/// Result of a successful submit, ready for one store call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "course", rename_all = "snake_case")]
pub enum CourseSubmission {
    Create(MedicationCourse),
    Update(MedicationCourse),
}

impl CourseSubmission {
    pub fn course(&self) -> &MedicationCourse {
        match self {
            Self::Create(c) | Self::Update(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum WizardMode {
    Create,
    Edit(Box<MedicationCourse>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWizard {
    open: bool,
    step: WizardStep,
    mode: WizardMode,
    draft: CourseDraft,
    hydrated: bool,
}

impl Default for CourseWizard {
    fn default() -> Self {
        Self {
            open: false,
            step: WizardStep::Identity,
            mode: WizardMode::Create,
            draft: CourseDraft::default(),
            hydrated: false,
        }
    }
}

impl CourseWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an empty wizard for a new course.
    pub fn open_create(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    /// Opens the wizard on an existing course. Only the first call of an open
    /// session fills the draft; later calls keep whatever was typed since.
    pub fn open_edit(&mut self, course: &MedicationCourse) {
        if self.open && self.hydrated {
            return;
        }
        *self = Self {
            open: true,
            mode: WizardMode::Edit(Box::new(course.clone())),
            draft: CourseDraft::from_course(course),
            hydrated: true,
            ..Self::default()
        };
        tracing::debug!(course_id = %course.id, "Course wizard hydrated");
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, WizardMode::Edit(_))
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &CourseDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CourseDraft {
        &mut self.draft
    }

    pub fn can_advance(&self) -> bool {
        self.step.next().is_some()
            && (self.step != WizardStep::Identity || !self.draft.medication_name.trim().is_empty())
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Identity && self.draft.medication_name.trim().is_empty() {
            return Err(WizardError::MissingMedicationName);
        }
        self.step = self.step.next().ok_or(WizardError::AlreadyAtLastStep)?;
        Ok(self.step)
    }

    /// Always allowed; stays on the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Packages the draft and closes the wizard. On error the wizard stays
    /// open with the draft intact.
    pub fn submit(&mut self, user_id: Uuid, now: DateTime<Utc>) -> Result<CourseSubmission, WizardError> {
        if !self.open {
            return Err(WizardError::NotOpen);
        }
        if self.step != WizardStep::Outcome {
            return Err(WizardError::NotAtFinalStep(self.step));
        }
        let name = self.draft.medication_name.trim();
        if name.is_empty() {
            return Err(WizardError::MissingMedicationName);
        }
        validate_effectiveness(self.draft.effectiveness)?;
        if let (Some(start), Some(end)) = (self.draft.start_date, self.draft.end_date) {
            if end < start {
                return Err(ValidationError::EndBeforeStart.into());
            }
        }

        let (id, created_at) = match &self.mode {
            WizardMode::Create => (Uuid::new_v4(), now),
            WizardMode::Edit(original) => (original.id, original.created_at),
        };
        let draft = &self.draft;
        let course = MedicationCourse {
            id,
            user_id,
            medication_name: name.to_string(),
            course_type: draft.course_type,
            dose_text: draft.dose_text(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            is_active: draft.is_active,
            baseline: draft.baseline.clone(),
            effectiveness: draft.effectiveness,
            has_side_effects: draft.has_side_effects,
            side_effects: non_blank(&draft.side_effects).filter(|_| draft.has_side_effects),
            discontinuation_reason: draft.discontinuation_reason,
            discontinuation_details: non_blank(&draft.discontinuation_details),
            physician_note: non_blank(&draft.physician_note),
            created_at,
            updated_at: now,
        };

        let submission = if self.is_edit() {
            CourseSubmission::Update(course)
        } else {
            CourseSubmission::Create(course)
        };
        *self = Self::default();
        Ok(submission)
    }

    /// Closes without saving; all steps' input is discarded.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{DoseRhythm, DoseUnit, ImpairmentLevel};
    use crate::models::DoseSchedule;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap()
    }

    fn stored_course() -> MedicationCourse {
        MedicationCourse {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            medication_name: "Topiramat".into(),
            course_type: CourseType::Prophylaxis,
            dose_text: Some("50 mg 1-0-1-0".into()),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            end_date: None,
            is_active: true,
            baseline: BaselineSeverity {
                days_with_symptom_min: Some(8),
                days_with_symptom_max: Some(12),
                impairment: Some(ImpairmentLevel::Moderate),
            },
            effectiveness: Some(6),
            has_side_effects: true,
            side_effects: Some("Kribbeln".into()),
            discontinuation_reason: None,
            discontinuation_details: None,
            physician_note: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap(),
        }
    }

    fn to_last_step(wizard: &mut CourseWizard) {
        while wizard.step() != WizardStep::Outcome {
            wizard.next().unwrap();
        }
    }

    #[test]
    fn identity_step_requires_name() {
        let mut wizard = CourseWizard::new();
        wizard.open_create();
        assert!(!wizard.can_advance());
        assert_eq!(wizard.next(), Err(WizardError::MissingMedicationName));

        wizard.draft_mut().medication_name = "   ".into();
        assert_eq!(wizard.next(), Err(WizardError::MissingMedicationName));
        assert_eq!(wizard.step(), WizardStep::Identity);

        wizard.draft_mut().medication_name = "Amitriptylin".into();
        assert!(wizard.can_advance());
        assert_eq!(wizard.next(), Ok(WizardStep::TimeRange));
    }

    #[test]
    fn later_steps_are_unguarded() {
        let mut wizard = CourseWizard::new();
        wizard.open_create();
        wizard.draft_mut().medication_name = "Amitriptylin".into();
        assert_eq!(wizard.next(), Ok(WizardStep::TimeRange));
        assert_eq!(wizard.next(), Ok(WizardStep::Baseline));
        assert_eq!(wizard.next(), Ok(WizardStep::Outcome));
        assert_eq!(wizard.next(), Err(WizardError::AlreadyAtLastStep));
        assert!(!wizard.can_advance());
    }

    #[test]
    fn back_keeps_entered_values() {
        let mut wizard = CourseWizard::new();
        wizard.open_create();
        wizard.draft_mut().medication_name = "Amitriptylin".into();
        wizard.next().unwrap();
        wizard.draft_mut().start_date = NaiveDate::from_ymd_opt(2026, 2, 1);
        wizard.next().unwrap();
        wizard.draft_mut().baseline.days_with_symptom_min = Some(4);

        assert_eq!(wizard.back(), WizardStep::TimeRange);
        assert_eq!(wizard.back(), WizardStep::Identity);
        assert_eq!(wizard.back(), WizardStep::Identity);
        assert_eq!(wizard.draft().medication_name, "Amitriptylin");
        assert_eq!(wizard.draft().start_date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(wizard.draft().baseline.days_with_symptom_min, Some(4));
    }

    #[test]
    fn edit_mode_decodes_dose_text() {
        let mut wizard = CourseWizard::new();
        wizard.open_edit(&stored_course());
        let dosage = &wizard.draft().dosage;
        assert_eq!(dosage.dose_value, "50");
        assert_eq!(dosage.dose_unit, DoseUnit::Mg);
        assert_eq!(dosage.dose_rhythm, DoseRhythm::Daily);
        assert_eq!(dosage.dose_schedule, DoseSchedule::new(1, 0, 1, 0));
        assert_eq!(wizard.step(), WizardStep::Identity);
    }

    #[test]
    fn hydration_happens_once_per_session() {
        let course = stored_course();
        let mut wizard = CourseWizard::new();
        wizard.open_edit(&course);
        wizard.draft_mut().medication_name = "Topiramat retard".into();

        // incidental re-open while still open must not reset the draft
        wizard.open_edit(&course);
        assert_eq!(wizard.draft().medication_name, "Topiramat retard");

        wizard.cancel();
        wizard.open_edit(&course);
        assert_eq!(wizard.draft().medication_name, "Topiramat");
    }

    #[test]
    fn submit_create_packages_whole_draft() {
        let mut wizard = CourseWizard::new();
        wizard.open_create();
        let draft = wizard.draft_mut();
        draft.medication_name = "  Erenumab ".into();
        draft.dosage = StructuredDosage {
            dose_value: "70".into(),
            dose_rhythm: DoseRhythm::Monthly,
            administration_route: crate::models::enums::AdministrationRoute::Subcutaneous,
            ..StructuredDosage::default()
        };
        draft.side_effects = Some("Verstopfung".into());
        to_last_step(&mut wizard);

        let submission = wizard.submit(Uuid::nil(), now()).unwrap();
        let CourseSubmission::Create(course) = submission else {
            panic!("expected create");
        };
        assert_eq!(course.medication_name, "Erenumab");
        assert_eq!(course.dose_text.as_deref(), Some("70 mg s.c. monatlich"));
        assert_eq!(course.created_at, now());
        // side-effect text only kept when the flag is set
        assert!(course.side_effects.is_none());
        assert!(!wizard.is_open());
    }

    #[test]
    fn submit_edit_keeps_identity() {
        let course = stored_course();
        let mut wizard = CourseWizard::new();
        wizard.open_edit(&course);
        to_last_step(&mut wizard);
        wizard.draft_mut().effectiveness = Some(8);

        let CourseSubmission::Update(updated) = wizard.submit(course.user_id, now()).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(updated.id, course.id);
        assert_eq!(updated.created_at, course.created_at);
        assert_eq!(updated.updated_at, now());
        assert_eq!(updated.effectiveness, Some(8));
        assert_eq!(updated.dose_text.as_deref(), Some("50 mg 1-0-1-0"));
    }

    #[test]
    fn submit_rejections_keep_draft() {
        let mut wizard = CourseWizard::new();
        assert_eq!(wizard.submit(Uuid::nil(), now()), Err(WizardError::NotOpen));

        wizard.open_create();
        wizard.draft_mut().medication_name = "Amitriptylin".into();
        assert_eq!(
            wizard.submit(Uuid::nil(), now()),
            Err(WizardError::NotAtFinalStep(WizardStep::Identity))
        );

        to_last_step(&mut wizard);
        wizard.draft_mut().effectiveness = Some(11);
        assert!(matches!(
            wizard.submit(Uuid::nil(), now()),
            Err(WizardError::Validation(ValidationError::EffectivenessOutOfRange(11)))
        ));

        wizard.draft_mut().effectiveness = Some(5);
        wizard.draft_mut().start_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        wizard.draft_mut().end_date = NaiveDate::from_ymd_opt(2026, 2, 1);
        assert_eq!(
            wizard.submit(Uuid::nil(), now()),
            Err(WizardError::Validation(ValidationError::EndBeforeStart))
        );
        assert!(wizard.is_open());
        assert_eq!(wizard.draft().medication_name, "Amitriptylin");
    }

    #[test]
    fn empty_dosage_is_not_encoded() {
        let mut wizard = CourseWizard::new();
        wizard.open_create();
        wizard.draft_mut().medication_name = "Magnesium".into();
        to_last_step(&mut wizard);
        let submission = wizard.submit(Uuid::nil(), now()).unwrap();
        assert!(submission.course().dose_text.is_none());
    }

    #[test]
    fn cancel_discards_everything() {
        let mut wizard = CourseWizard::new();
        wizard.open_create();
        wizard.draft_mut().medication_name = "Amitriptylin".into();
        wizard.next().unwrap();
        wizard.cancel();
        assert!(!wizard.is_open());
        assert_eq!(wizard.step(), WizardStep::Identity);
        assert_eq!(wizard.draft(), &CourseDraft::default());
    }
}
