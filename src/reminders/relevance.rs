//! Derived reminder views relative to "now": currently relevant, medication
//! list with a range filter, upcoming appointments.
//!
//! Every view drops reminders without a usable `date_time` instead of failing.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DiaryConfig;
use crate::models::enums::ReminderType;
use crate::models::Reminder;

/// Range filter of the medication view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Next7Days,
    Next30Days,
    All,
}

impl DateRange {
    /// Number of calendar days covered starting today; `None` for `All`.
    fn days(&self) -> Option<i64> {
        match self {
            Self::Today => Some(1),
            Self::Next7Days => Some(7),
            Self::Next30Days => Some(30),
            Self::All => None,
        }
    }
}

/// How many upcoming appointments the appointment view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentLimit {
    Next,
    NextThree,
    All,
}

impl AppointmentLimit {
    fn count(&self) -> usize {
        match self {
            Self::Next => 1,
            Self::NextThree => 3,
            Self::All => usize::MAX,
        }
    }
}

/// Evaluation instant plus the windows the views are computed with.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceContext {
    pub now: DateTime<Utc>,
    pub zone: FixedOffset,
    pub medication_window: Duration,
    pub appointment_window: Duration,
}

impl RelevanceContext {
    pub fn new(now: DateTime<Utc>, config: &DiaryConfig) -> Self {
        Self {
            now,
            zone: config.reference_zone,
            medication_window: Duration::hours(config.medication_window_hours),
            appointment_window: Duration::hours(config.appointment_window_hours),
        }
    }

    fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.zone).date_naive()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }
}

/// Reminders that need attention now.
///
/// Included when any of these hold, each reminder at most once:
/// pending and overdue; due on today's reference-zone date; a medication
/// within `(now, now + medication_window]`; an appointment within
/// `(now, now + appointment_window]`.
pub fn currently_relevant(reminders: &[Reminder], ctx: &RelevanceContext) -> Vec<Reminder> {
    let today = ctx.today();
    let mut relevant: Vec<Reminder> = with_date(reminders)
        .filter(|(r, at)| {
            if r.is_overdue(ctx.now) || ctx.local_date(*at) == today {
                return true;
            }
            let window = match r.reminder_type {
                ReminderType::Medication => ctx.medication_window,
                ReminderType::Appointment => ctx.appointment_window,
                ReminderType::Todo => return false,
            };
            *at > ctx.now && *at <= ctx.now + window
        })
        .map(|(r, _)| r.clone())
        .collect();
    sort_ascending(&mut relevant);
    relevant
}

/// Medication reminders in `range`, plus every overdue pending one.
pub fn medication_view(
    reminders: &[Reminder],
    range: DateRange,
    ctx: &RelevanceContext,
) -> Vec<Reminder> {
    let today = ctx.today();
    let mut view: Vec<Reminder> = with_date(reminders)
        .filter(|(r, _)| r.reminder_type == ReminderType::Medication)
        .filter(|(r, at)| {
            if r.is_overdue(ctx.now) {
                return true;
            }
            match range.days() {
                None => true,
                Some(days) => {
                    let date = ctx.local_date(*at);
                    date >= today && date < today + Duration::days(days)
                }
            }
        })
        .map(|(r, _)| r.clone())
        .collect();
    sort_ascending(&mut view);
    view
}

/// Appointments at or after now, soonest first, cut to `limit`.
pub fn appointment_view(
    reminders: &[Reminder],
    limit: AppointmentLimit,
    now: DateTime<Utc>,
) -> Vec<Reminder> {
    let mut view: Vec<Reminder> = with_date(reminders)
        .filter(|(r, at)| r.reminder_type == ReminderType::Appointment && *at >= now)
        .map(|(r, _)| r.clone())
        .collect();
    sort_ascending(&mut view);
    view.truncate(limit.count());
    view
}

/// Pairs reminders with their instant, dropping the malformed ones.
fn with_date(reminders: &[Reminder]) -> impl Iterator<Item = (&Reminder, DateTime<Utc>)> {
    reminders.iter().filter_map(|r| match r.date_time {
        Some(at) => Some((r, at)),
        None => {
            tracing::warn!(reminder_id = %r.id, "Reminder without date_time excluded from view");
            None
        }
    })
}

fn sort_ascending(reminders: &mut [Reminder]) {
    reminders.sort_by_key(|r| r.date_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{ReminderStatus, RepeatRule};
    use crate::models::FollowUp;
    use chrono::TimeZone;
    use uuid::Uuid;

    // 10:00 local (+01:00), so the 24h/48h boundaries fall on later days.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn ctx() -> RelevanceContext {
        RelevanceContext::new(now(), &DiaryConfig::default())
    }

    fn reminder(kind: ReminderType, at: Option<DateTime<Utc>>) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            reminder_type: kind,
            title: kind.as_str().into(),
            date_time: at,
            repeat: RepeatRule::Never,
            notes: None,
            notification_enabled: true,
            status: ReminderStatus::Pending,
            medications: vec![],
            time_of_day: None,
            series_id: None,
            follow_up: FollowUp::default(),
            notify_offsets_minutes: vec![],
        }
    }

    fn ids(list: &[Reminder]) -> Vec<Uuid> {
        list.iter().map(|r| r.id).collect()
    }

    // ───────────────────────────────────────
    // currently relevant
    // ───────────────────────────────────────

    #[test]
    fn medication_window_boundaries() {
        let inside = reminder(
            ReminderType::Medication,
            Some(now() + Duration::hours(24) - Duration::minutes(1)),
        );
        let outside = reminder(
            ReminderType::Medication,
            Some(now() + Duration::hours(24) + Duration::minutes(1)),
        );
        let relevant = currently_relevant(&[inside.clone(), outside], &ctx());
        assert_eq!(ids(&relevant), vec![inside.id]);
    }

    #[test]
    fn appointment_window_boundaries() {
        let inside = reminder(
            ReminderType::Appointment,
            Some(now() + Duration::hours(48) - Duration::minutes(1)),
        );
        let outside = reminder(
            ReminderType::Appointment,
            Some(now() + Duration::hours(48) + Duration::minutes(1)),
        );
        let relevant = currently_relevant(&[outside, inside.clone()], &ctx());
        assert_eq!(ids(&relevant), vec![inside.id]);
    }

    #[test]
    fn window_end_is_inclusive() {
        let edge = reminder(ReminderType::Medication, Some(now() + Duration::hours(24)));
        assert_eq!(currently_relevant(&[edge], &ctx()).len(), 1);
    }

    #[test]
    fn overdue_pending_is_relevant() {
        let yesterday = now() - Duration::days(1) - Duration::seconds(1);
        let overdue = reminder(ReminderType::Todo, Some(yesterday));
        let mut done = reminder(ReminderType::Todo, Some(yesterday));
        done.status = ReminderStatus::Done;

        let relevant = currently_relevant(&[overdue.clone(), done], &ctx());
        assert_eq!(ids(&relevant), vec![overdue.id]);
    }

    #[test]
    fn one_second_overdue_is_relevant() {
        let r = reminder(ReminderType::Medication, Some(now() - Duration::seconds(1)));
        assert_eq!(currently_relevant(&[r], &ctx()).len(), 1);
    }

    #[test]
    fn todo_due_later_today_is_relevant() {
        let evening = reminder(ReminderType::Todo, Some(now() + Duration::hours(10)));
        let tomorrow = reminder(ReminderType::Todo, Some(now() + Duration::hours(16)));
        let relevant = currently_relevant(&[tomorrow, evening.clone()], &ctx());
        assert_eq!(ids(&relevant), vec![evening.id]);
    }

    #[test]
    fn included_once_even_when_several_rules_match() {
        let soon = reminder(ReminderType::Medication, Some(now() + Duration::hours(1)));
        assert_eq!(currently_relevant(&[soon], &ctx()).len(), 1);
    }

    #[test]
    fn malformed_reminder_is_excluded() {
        let broken = reminder(ReminderType::Medication, None);
        let ok = reminder(ReminderType::Medication, Some(now() + Duration::hours(2)));
        let relevant = currently_relevant(&[broken, ok.clone()], &ctx());
        assert_eq!(ids(&relevant), vec![ok.id]);
    }

    // ───────────────────────────────────────
    // medication view
    // ───────────────────────────────────────

    #[test]
    fn range_filter_never_hides_overdue() {
        let overdue = reminder(ReminderType::Medication, Some(now() - Duration::days(3)));
        let today = reminder(ReminderType::Medication, Some(now() + Duration::hours(2)));
        let next_week = reminder(ReminderType::Medication, Some(now() + Duration::days(5)));
        let next_month = reminder(ReminderType::Medication, Some(now() + Duration::days(20)));
        let all = [next_month.clone(), next_week.clone(), today.clone(), overdue.clone()];

        for range in [DateRange::Today, DateRange::Next7Days, DateRange::Next30Days, DateRange::All] {
            let view = medication_view(&all, range, &ctx());
            assert!(view.iter().any(|r| r.id == overdue.id), "{range:?} hid overdue");
        }

        assert_eq!(
            ids(&medication_view(&all, DateRange::Today, &ctx())),
            vec![overdue.id, today.id]
        );
        assert_eq!(
            ids(&medication_view(&all, DateRange::Next7Days, &ctx())),
            vec![overdue.id, today.id, next_week.id]
        );
        assert_eq!(medication_view(&all, DateRange::Next30Days, &ctx()).len(), 4);
    }

    #[test]
    fn medication_view_ignores_other_types_and_done_past() {
        let appt = reminder(ReminderType::Appointment, Some(now() + Duration::hours(1)));
        let mut taken = reminder(ReminderType::Medication, Some(now() - Duration::days(2)));
        taken.status = ReminderStatus::Done;
        assert!(medication_view(&[appt, taken], DateRange::All, &ctx())
            .iter()
            .all(|r| r.status == ReminderStatus::Done));
        // `All` still shows the done one; narrower ranges do not.
        let mut taken = reminder(ReminderType::Medication, Some(now() - Duration::days(2)));
        taken.status = ReminderStatus::Done;
        assert!(medication_view(&[taken], DateRange::Today, &ctx()).is_empty());
    }

    // ───────────────────────────────────────
    // appointment view
    // ───────────────────────────────────────

    #[test]
    fn appointment_limits() {
        let past = reminder(ReminderType::Appointment, Some(now() - Duration::hours(1)));
        let a = reminder(ReminderType::Appointment, Some(now() + Duration::days(1)));
        let b = reminder(ReminderType::Appointment, Some(now() + Duration::days(2)));
        let c = reminder(ReminderType::Appointment, Some(now() + Duration::days(3)));
        let d = reminder(ReminderType::Appointment, Some(now() + Duration::days(4)));
        let all = [d.clone(), past, c.clone(), a.clone(), b.clone()];

        assert_eq!(ids(&appointment_view(&all, AppointmentLimit::Next, now())), vec![a.id]);
        assert_eq!(
            ids(&appointment_view(&all, AppointmentLimit::NextThree, now())),
            vec![a.id, b.id, c.id]
        );
        assert_eq!(
            ids(&appointment_view(&all, AppointmentLimit::All, now())),
            vec![a.id, b.id, c.id, d.id]
        );
    }

    #[test]
    fn appointment_at_now_is_included() {
        let at_now = reminder(ReminderType::Appointment, Some(now()));
        assert_eq!(appointment_view(&[at_now], AppointmentLimit::All, now()).len(), 1);
    }
}
