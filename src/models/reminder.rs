use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FollowUpUnit, ReminderStatus, ReminderType, RepeatRule, TimeOfDay};

/// One scheduled notification intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reminder_type: ReminderType,
    pub title: String,
    /// `None` when the stored instant could not be parsed.
    pub date_time: Option<DateTime<Utc>>,
    pub repeat: RepeatRule,
    pub notes: Option<String>,
    pub notification_enabled: bool,
    pub status: ReminderStatus,
    pub medications: Vec<String>,
    pub time_of_day: Option<TimeOfDay>,
    pub series_id: Option<Uuid>,
    pub follow_up: FollowUp,
    pub notify_offsets_minutes: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub enabled: bool,
    pub interval_value: Option<u32>,
    pub interval_unit: Option<FollowUpUnit>,
    pub next_date: Option<DateTime<Utc>>,
}

impl FollowUp {
    /// Configured interval in minutes; `None` while value or unit is unset.
    pub fn interval_minutes(&self) -> Option<i64> {
        Some(i64::from(self.interval_value?) * self.interval_unit?.minutes())
    }
}

impl Reminder {
    pub fn is_pending(&self) -> bool {
        self.status == ReminderStatus::Pending
    }

    /// Pending and strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.date_time.is_some_and(|dt| dt < now)
    }
}
