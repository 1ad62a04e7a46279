//! Reminder creation from the form, repeat and follow-up arithmetic, and the
//! notification trigger list.

use std::collections::BTreeSet;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ReminderError;
use crate::db::{get_reminder, update_reminder, DatabaseError};
use crate::models::enums::{ReminderStatus, ReminderType, RepeatRule, TimeOfDay};
use crate::models::{FollowUp, Reminder};
use crate::validation::{
    validate_follow_up, validate_mark_done, validate_offsets, validate_title, ValidationError,
};

/// Reminder form as submitted by the user.
///
/// Selecting several times of day yields one reminder per slot, all sharing a
/// fresh `series_id`. Without any slot, `time` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderForm {
    pub reminder_type: ReminderType,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub times_of_day: Vec<TimeOfDay>,
    pub repeat: RepeatRule,
    pub notes: Option<String>,
    pub notification_enabled: bool,
    pub medications: Vec<String>,
    pub notify_offsets_minutes: Vec<u32>,
    pub follow_up: FollowUp,
}

impl ReminderForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_offsets(&self.notify_offsets_minutes)?;
        validate_follow_up(&self.follow_up)?;
        if self.times_of_day.is_empty() && self.time.is_none() {
            return Err(ValidationError::MissingTime);
        }
        Ok(())
    }

    /// Distinct selected slots in day order.
    pub fn slots(&self) -> BTreeSet<TimeOfDay> {
        self.times_of_day.iter().copied().collect()
    }

    /// Validates and expands the form into reminders ready to insert.
    pub fn build(&self, user_id: Uuid, zone: &FixedOffset) -> Result<Vec<Reminder>, ValidationError> {
        self.validate()?;

        let slots = self.slots();
        let series_id = (slots.len() > 1).then(Uuid::new_v4);
        let medications = if self.reminder_type == ReminderType::Medication {
            self.medications.clone()
        } else {
            Vec::new()
        };

        let make = |slot: Option<TimeOfDay>, time: NaiveTime| Reminder {
            id: Uuid::new_v4(),
            user_id,
            reminder_type: self.reminder_type,
            title: self.title.trim().to_string(),
            date_time: local_instant(self.date, time, zone),
            repeat: self.repeat,
            notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
            notification_enabled: self.notification_enabled,
            status: ReminderStatus::Pending,
            medications: medications.clone(),
            time_of_day: slot,
            series_id,
            follow_up: self.follow_up.clone(),
            notify_offsets_minutes: self.notify_offsets_minutes.clone(),
        };

        if slots.is_empty() {
            let time = self.time.ok_or(ValidationError::MissingTime)?;
            return Ok(vec![make(None, time)]);
        }

        Ok(slots
            .into_iter()
            .map(|slot| make(Some(slot), slot_time(slot)))
            .collect())
    }
}

/// Default clock time of a time-of-day slot.
pub fn slot_time(slot: TimeOfDay) -> NaiveTime {
    let (h, m) = slot.default_time();
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Wall-clock date and time in `zone` as an instant.
pub fn local_instant(date: NaiveDate, time: NaiveTime, zone: &FixedOffset) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

// ═══════════════════════════════════════════
// Repeat arithmetic
// ═══════════════════════════════════════════

/// First occurrence strictly after `after`, following the repeat rule.
///
/// Weekday series skip Saturday and Sunday; monthly series keep the day of
/// month of the first occurrence, clamped to shorter months.
pub fn next_occurrence(
    reminder: &Reminder,
    after: DateTime<Utc>,
    zone: &FixedOffset,
) -> Option<DateTime<Utc>> {
    let base = reminder.date_time?;
    match reminder.repeat {
        RepeatRule::Never => (base > after).then_some(base),
        RepeatRule::Daily => Some(step_days(base, after, 1)),
        RepeatRule::Weekly => Some(step_days(base, after, 7)),
        RepeatRule::Weekdays => {
            let mut candidate = step_days(base, after, 1);
            while is_weekend(candidate.with_timezone(zone).weekday()) {
                candidate += Duration::days(1);
            }
            Some(candidate)
        }
        RepeatRule::Monthly => next_monthly(base, after, zone),
    }
}

/// `base + k * period_days` for the smallest k ≥ 0 landing after `after`.
fn step_days(base: DateTime<Utc>, after: DateTime<Utc>, period_days: i64) -> DateTime<Utc> {
    if base > after {
        return base;
    }
    let period_secs = Duration::days(period_days).num_seconds();
    let steps = (after - base).num_seconds().div_euclid(period_secs) + 1;
    base + Duration::days(period_days * steps)
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn next_monthly(
    base: DateTime<Utc>,
    after: DateTime<Utc>,
    zone: &FixedOffset,
) -> Option<DateTime<Utc>> {
    if base > after {
        return Some(base);
    }
    let local = base.with_timezone(zone);
    let after_local = after.with_timezone(zone);
    let elapsed_months = (after_local.year() - local.year()) * 12
        + after_local.month() as i32
        - local.month() as i32;

    for k in elapsed_months.max(1)..=elapsed_months.max(1) + 2 {
        let date = add_months_clamped(local.date_naive(), k)?;
        let candidate = local_instant(date, local.time(), zone)?;
        if candidate > after {
            return Some(candidate);
        }
    }
    None
}

/// Adds `months`, clamping the day to the end of the target month.
pub fn add_months_clamped(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = add_months_first(first)?;
    Some((next - first).num_days() as u32)
}

fn add_months_first(first: NaiveDate) -> Option<NaiveDate> {
    if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
}

/// When a follow-up should fire, counted from `from`. `None` if disabled,
/// incomplete, or past the representable date range.
pub fn follow_up_date(reminder: &Reminder, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let follow_up = &reminder.follow_up;
    if !follow_up.enabled {
        return None;
    }
    let delta = Duration::try_minutes(follow_up.interval_minutes()?)?;
    from.checked_add_signed(delta)
}

/// Notification instants: the main trigger plus one per lead offset,
/// deduplicated, ascending, without triggers at or before `now`.
pub fn trigger_times(reminder: &Reminder, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let Some(main) = reminder.date_time else {
        return Vec::new();
    };
    if !reminder.notification_enabled {
        return Vec::new();
    }
    let triggers: BTreeSet<DateTime<Utc>> = std::iter::once(main)
        .chain(
            reminder
                .notify_offsets_minutes
                .iter()
                .map(|m| main - Duration::minutes(i64::from(*m))),
        )
        .filter(|t| *t > now)
        .collect();
    triggers.into_iter().collect()
}

/// Marks a pending reminder done and stamps its follow-up date.
pub fn mark_done(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
    now: DateTime<Utc>,
) -> Result<Reminder, ReminderError> {
    let mut reminder = get_reminder(conn, user_id, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Reminder".into(),
        id: id.to_string(),
    })?;
    validate_mark_done(reminder.status)?;

    reminder.status = ReminderStatus::Done;
    reminder.follow_up.next_date = follow_up_date(&reminder, now);
    update_reminder(conn, &reminder)?;
    tracing::info!(reminder_id = %id, follow_up = ?reminder.follow_up.next_date, "Reminder marked done");
    Ok(reminder)
}
