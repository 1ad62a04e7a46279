use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::schedule::trigger_times;
use crate::models::Reminder;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification backend error: {0}")]
    Backend(String),

    #[error("Internal lock error")]
    LockPoisoned,
}

/// One local notification handed to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub reminder_id: Uuid,
    pub trigger_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// Platform notification delivery.
pub trait NotificationScheduler: Send + Sync {
    fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError>;

    /// Removes every pending notification of a reminder.
    fn cancel(&self, reminder_id: &Uuid) -> Result<(), NotifyError>;
}

/// Scheduler keeping the queue in memory. Used until a platform backend is
/// attached, and by tests.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    queue: Mutex<Vec<ScheduledNotification>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the queue ordered by trigger instant.
    pub fn pending(&self) -> Result<Vec<ScheduledNotification>, NotifyError> {
        let queue = self.queue.lock().map_err(|_| NotifyError::LockPoisoned)?;
        let mut pending = queue.clone();
        pending.sort_by_key(|n| n.trigger_at);
        Ok(pending)
    }
}

impl NotificationScheduler for InMemoryScheduler {
    fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError> {
        self.queue
            .lock()
            .map_err(|_| NotifyError::LockPoisoned)?
            .push(notification);
        Ok(())
    }

    fn cancel(&self, reminder_id: &Uuid) -> Result<(), NotifyError> {
        self.queue
            .lock()
            .map_err(|_| NotifyError::LockPoisoned)?
            .retain(|n| n.reminder_id != *reminder_id);
        Ok(())
    }
}

/// Replaces the queued notifications of `reminder` with its current triggers.
/// Returns how many were scheduled.
pub fn sync_notifications(
    scheduler: &dyn NotificationScheduler,
    reminder: &Reminder,
    now: DateTime<Utc>,
) -> Result<usize, NotifyError> {
    scheduler.cancel(&reminder.id)?;
    if !reminder.status.is_open() {
        return Ok(0);
    }

    let triggers = trigger_times(reminder, now);
    for at in &triggers {
        scheduler.schedule(ScheduledNotification {
            reminder_id: reminder.id,
            trigger_at: *at,
            title: reminder.title.clone(),
            body: notification_body(reminder, *at),
        })?;
    }
    tracing::debug!(reminder_id = %reminder.id, count = triggers.len(), "Synced notifications");
    Ok(triggers.len())
}

fn notification_body(reminder: &Reminder, at: DateTime<Utc>) -> String {
    let lead = reminder
        .date_time
        .map(|main| (main - at).num_minutes())
        .unwrap_or(0);
    let detail = if reminder.medications.is_empty() {
        reminder.notes.clone().unwrap_or_default()
    } else {
        reminder.medications.join(", ")
    };
    match (lead, detail.is_empty()) {
        (0, true) => reminder.title.clone(),
        (0, false) => detail,
        (m, true) => format!("In {m} Minuten"),
        (m, false) => format!("In {m} Minuten: {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{ReminderStatus, ReminderType, RepeatRule};
    use crate::models::FollowUp;
    use chrono::{Duration, TimeZone};

    fn reminder(offsets: Vec<u32>) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            reminder_type: ReminderType::Medication,
            title: "Abendmedikation".into(),
            date_time: Some(Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap()),
            repeat: RepeatRule::Never,
            notes: None,
            notification_enabled: true,
            status: ReminderStatus::Pending,
            medications: vec!["Topiramat".into(), "Magnesium".into()],
            time_of_day: None,
            series_id: None,
            follow_up: FollowUp::default(),
            notify_offsets_minutes: offsets,
        }
    }

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn sync_schedules_main_and_offsets() {
        let scheduler = InMemoryScheduler::new();
        let r = reminder(vec![30]);
        assert_eq!(sync_notifications(&scheduler, &r, morning()).unwrap(), 2);

        let pending = scheduler.pending().unwrap();
        assert_eq!(pending[0].trigger_at, r.date_time.unwrap() - Duration::minutes(30));
        assert_eq!(pending[0].body, "In 30 Minuten: Topiramat, Magnesium");
        assert_eq!(pending[1].body, "Topiramat, Magnesium");
    }

    #[test]
    fn resync_replaces_previous_notifications() {
        let scheduler = InMemoryScheduler::new();
        let mut r = reminder(vec![30, 60]);
        sync_notifications(&scheduler, &r, morning()).unwrap();
        r.notify_offsets_minutes.clear();
        sync_notifications(&scheduler, &r, morning()).unwrap();
        assert_eq!(scheduler.pending().unwrap().len(), 1);
    }

    #[test]
    fn closed_reminders_are_only_cancelled() {
        let scheduler = InMemoryScheduler::new();
        let mut r = reminder(vec![]);
        sync_notifications(&scheduler, &r, morning()).unwrap();
        r.status = ReminderStatus::Done;
        assert_eq!(sync_notifications(&scheduler, &r, morning()).unwrap(), 0);
        assert!(scheduler.pending().unwrap().is_empty());
    }

    #[test]
    fn cancel_leaves_other_reminders() {
        let scheduler = InMemoryScheduler::new();
        let a = reminder(vec![]);
        let b = reminder(vec![]);
        sync_notifications(&scheduler, &a, morning()).unwrap();
        sync_notifications(&scheduler, &b, morning()).unwrap();
        scheduler.cancel(&a.id).unwrap();
        let pending = scheduler.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reminder_id, b.id);
    }
}
