use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CourseType, DiscontinuationReason, ImpairmentLevel};

/// Historical or ongoing treatment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationCourse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub medication_name: String,
    pub course_type: CourseType,
    pub dose_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub baseline: BaselineSeverity,
    /// Subjective effectiveness, 0-10.
    pub effectiveness: Option<u8>,
    pub has_side_effects: bool,
    pub side_effects: Option<String>,
    pub discontinuation_reason: Option<DiscontinuationReason>,
    pub discontinuation_details: Option<String>,
    pub physician_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Symptom burden before the course started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSeverity {
    /// Headache days per month, lower bound.
    pub days_with_symptom_min: Option<u8>,
    /// Headache days per month, upper bound.
    pub days_with_symptom_max: Option<u8>,
    pub impairment: Option<ImpairmentLevel>,
}
