//! Input checks applied before anything reaches the store.

use thiserror::Error;

use crate::config::{MAX_FOLLOW_UP_MINUTES, MAX_NOTIFY_OFFSETS, NOTE_MAX_CHARS};
use crate::models::enums::ReminderStatus;
use crate::models::FollowUp;

/// Maximum value of the pain and effectiveness scales.
pub const SCALE_MAX: u8 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Note text cannot be empty")]
    EmptyNote,

    #[error("Note text exceeds {max} characters ({actual})")]
    NoteTooLong { max: usize, actual: usize },

    #[error("Pain intensity must be between 0 and 10, got {0}")]
    IntensityOutOfRange(u8),

    #[error("At most {max} notification lead times are allowed, got {actual}")]
    TooManyOffsets { max: usize, actual: usize },

    #[error("Reminder title cannot be empty")]
    EmptyTitle,

    #[error("Effectiveness must be between 0 and 10, got {0}")]
    EffectivenessOutOfRange(u8),

    #[error("A time is required when no time of day is selected")]
    MissingTime,

    #[error("Cannot mark a {0} reminder as done")]
    InvalidStatusTransition(ReminderStatus),

    #[error("Medication name cannot be empty")]
    EmptyMedicationName,

    #[error("End date lies before the start date")]
    EndBeforeStart,

    #[error("Follow-up interval exceeds {max} minutes ({actual})")]
    FollowUpTooLong { max: i64, actual: i64 },
}

/// Trims a note and checks it against the length cap (in characters).
pub fn validate_note_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyNote);
    }
    let actual = trimmed.chars().count();
    if actual > NOTE_MAX_CHARS {
        return Err(ValidationError::NoteTooLong {
            max: NOTE_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_intensity(intensity: u8) -> Result<(), ValidationError> {
    if intensity > SCALE_MAX {
        return Err(ValidationError::IntensityOutOfRange(intensity));
    }
    Ok(())
}

pub fn validate_effectiveness(effectiveness: Option<u8>) -> Result<(), ValidationError> {
    match effectiveness {
        Some(v) if v > SCALE_MAX => Err(ValidationError::EffectivenessOutOfRange(v)),
        _ => Ok(()),
    }
}

pub fn validate_offsets(offsets: &[u32]) -> Result<(), ValidationError> {
    if offsets.len() > MAX_NOTIFY_OFFSETS {
        return Err(ValidationError::TooManyOffsets {
            max: MAX_NOTIFY_OFFSETS,
            actual: offsets.len(),
        });
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// An enabled follow-up must fit within `MAX_FOLLOW_UP_MINUTES`.
pub fn validate_follow_up(follow_up: &FollowUp) -> Result<(), ValidationError> {
    if !follow_up.enabled {
        return Ok(());
    }
    match follow_up.interval_minutes() {
        Some(actual) if actual > MAX_FOLLOW_UP_MINUTES => Err(ValidationError::FollowUpTooLong {
            max: MAX_FOLLOW_UP_MINUTES,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Only open reminders (pending or processing) can be marked done.
pub fn validate_mark_done(status: ReminderStatus) -> Result<(), ValidationError> {
    if !status.is_open() {
        return Err(ValidationError::InvalidStatusTransition(status));
    }
    Ok(())
}
