//! Reminder commands: creation, relevance views, group edits, mark done.
//!
//! Every write is followed by a notification sync so the scheduler queue
//! mirrors the stored reminders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::AppState;
use crate::db;
use crate::models::Reminder;
use crate::reminders::{
    self, AppointmentLimit, DateRange, GroupEditPlan, RelevanceContext, ReminderForm,
    ReminderGroup,
};

/// The three reminder views shown on the overview screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderOverview {
    pub current: Vec<Reminder>,
    pub medication: Vec<Reminder>,
    pub appointments: Vec<Reminder>,
}

fn sync_all(state: &AppState, reminders: &[Reminder], now: DateTime<Utc>) -> Result<(), String> {
    for reminder in reminders {
        reminders::sync_notifications(state.scheduler.as_ref(), reminder, now)
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Creates one reminder per selected time of day.
pub fn create_reminders(state: &AppState, form: ReminderForm) -> Result<Vec<Reminder>, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let created = form
        .build(user_id, &state.config.reference_zone)
        .map_err(|e| e.to_string())?;

    let conn = state.db().map_err(|e| e.to_string())?;
    db::insert_reminders(&conn, &created).map_err(|e| e.to_string())?;
    sync_all(state, &created, Utc::now())?;

    tracing::info!(count = created.len(), "Reminders created");
    Ok(created)
}

pub fn get_reminder_overview(
    state: &AppState,
    range: DateRange,
    limit: AppointmentLimit,
) -> Result<ReminderOverview, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    let all = db::list_reminders(&conn, &user_id).map_err(|e| e.to_string())?;

    let ctx = RelevanceContext::new(Utc::now(), &state.config);
    Ok(ReminderOverview {
        current: reminders::currently_relevant(&all, &ctx),
        medication: reminders::medication_view(&all, range, &ctx),
        appointments: reminders::appointment_view(&all, limit, ctx.now),
    })
}

/// All reminders, with series collapsed into one group each.
pub fn get_reminder_groups(state: &AppState) -> Result<Vec<ReminderGroup>, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    let all = db::list_reminders(&conn, &user_id).map_err(|e| e.to_string())?;
    Ok(reminders::group_by_series(&all))
}

pub fn mark_reminder_done(state: &AppState, reminder_id: String) -> Result<Reminder, String> {
    let id = Uuid::parse_str(&reminder_id).map_err(|e| format!("Invalid reminder ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;

    let now = Utc::now();
    let done = reminders::mark_done(&conn, &user_id, &id, now).map_err(|e| e.to_string())?;
    sync_all(state, std::slice::from_ref(&done), now)?;
    Ok(done)
}

/// Applies an edit to the group containing `reminder_id`.
pub fn edit_reminder_group(
    state: &AppState,
    reminder_id: String,
    form: ReminderForm,
) -> Result<Vec<Reminder>, String> {
    let id = Uuid::parse_str(&reminder_id).map_err(|e| format!("Invalid reminder ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;

    let all = db::list_reminders(&conn, &user_id).map_err(|e| e.to_string())?;
    let group = reminders::group_by_series(&all)
        .into_iter()
        .find(|g| g.member_ids().contains(&id))
        .ok_or_else(|| format!("Reminder not found: {id}"))?;

    let plan = reminders::plan_group_edit(&group, &form, &state.config.reference_zone)
        .map_err(|e| e.to_string())?;
    let result = reminders::apply_group_edit(&conn, &user_id, &plan).map_err(|e| e.to_string())?;
    // Old members keep their notifications until the store change committed.
    if let GroupEditPlan::Recreate { delete, .. } = &plan {
        for removed in delete {
            state.scheduler.cancel(removed).map_err(|e| e.to_string())?;
        }
    }
    sync_all(state, &result, Utc::now())?;
    Ok(result)
}

/// Deletes a reminder; with `whole_series`, every member of its series.
pub fn delete_reminder(
    state: &AppState,
    reminder_id: String,
    whole_series: bool,
) -> Result<usize, String> {
    let id = Uuid::parse_str(&reminder_id).map_err(|e| format!("Invalid reminder ID: {e}"))?;
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;

    let reminder = db::get_reminder(&conn, &user_id, &id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Reminder not found: {id}"))?;

    let members = match reminder.series_id.filter(|_| whole_series) {
        Some(series_id) => {
            let members = db::list_series(&conn, &user_id, &series_id).map_err(|e| e.to_string())?;
            db::delete_series(&conn, &user_id, &series_id).map_err(|e| e.to_string())?;
            members.iter().map(|r| r.id).collect()
        }
        None => {
            db::delete_reminder(&conn, &user_id, &id).map_err(|e| e.to_string())?;
            vec![id]
        }
    };
    for member in &members {
        state.scheduler.cancel(member).map_err(|e| e.to_string())?;
    }
    tracing::info!(count = members.len(), "Reminders deleted");
    Ok(members.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiaryConfig;
    use crate::models::enums::{ReminderStatus, ReminderType, RepeatRule, TimeOfDay};
    use crate::models::FollowUp;
    use crate::reminders::InMemoryScheduler;
    use chrono::Duration;
    use std::sync::Arc;

    fn signed_in() -> (AppState, Arc<InMemoryScheduler>) {
        let scheduler = Arc::new(InMemoryScheduler::new());
        let state = AppState::in_memory(DiaryConfig::default())
            .unwrap()
            .with_scheduler(scheduler.clone());
        state.sign_in(Uuid::new_v4()).unwrap();
        (state, scheduler)
    }

    fn tomorrow_form(slots: Vec<TimeOfDay>) -> ReminderForm {
        let tomorrow = (Utc::now() + Duration::days(1))
            .with_timezone(&crate::config::reference_zone())
            .date_naive();
        ReminderForm {
            reminder_type: ReminderType::Medication,
            title: "Topiramat".into(),
            date: tomorrow,
            time: None,
            times_of_day: slots,
            repeat: RepeatRule::Daily,
            notes: None,
            notification_enabled: true,
            medications: vec!["Topiramat".into()],
            notify_offsets_minutes: vec![15],
            follow_up: FollowUp::default(),
        }
    }

    #[test]
    fn commands_require_signed_in_user() {
        let state = AppState::in_memory(DiaryConfig::default()).unwrap();
        let err = create_reminders(&state, tomorrow_form(vec![TimeOfDay::Morning])).unwrap_err();
        assert_eq!(err, "No user signed in");
    }

    #[test]
    fn create_schedules_notifications_per_slot() {
        let (state, scheduler) = signed_in();
        let created =
            create_reminders(&state, tomorrow_form(vec![TimeOfDay::Morning, TimeOfDay::Evening]))
                .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created[0].series_id.is_some());
        // main trigger plus one lead time each
        assert_eq!(scheduler.pending().unwrap().len(), 4);
        assert_eq!(get_reminder_groups(&state).unwrap().len(), 1);
    }

    #[test]
    fn mark_done_clears_queue() {
        let (state, scheduler) = signed_in();
        let created = create_reminders(&state, tomorrow_form(vec![TimeOfDay::Noon])).unwrap();
        let done = mark_reminder_done(&state, created[0].id.to_string()).unwrap();
        assert_eq!(done.status, ReminderStatus::Done);
        assert!(scheduler.pending().unwrap().is_empty());

        let again = mark_reminder_done(&state, created[0].id.to_string());
        assert!(again.is_err());
    }

    #[test]
    fn group_edit_with_new_slots_replaces_series() {
        let (state, scheduler) = signed_in();
        let created =
            create_reminders(&state, tomorrow_form(vec![TimeOfDay::Morning, TimeOfDay::Evening]))
                .unwrap();
        let edited = edit_reminder_group(
            &state,
            created[0].id.to_string(),
            tomorrow_form(vec![TimeOfDay::Morning, TimeOfDay::Noon, TimeOfDay::Evening]),
        )
        .unwrap();
        assert_eq!(edited.len(), 3);
        assert!(edited.iter().all(|r| !created.iter().any(|c| c.id == r.id)));
        assert_eq!(scheduler.pending().unwrap().len(), 6);
    }

    #[test]
    fn failed_group_edit_keeps_notifications() {
        let (state, scheduler) = signed_in();
        let created =
            create_reminders(&state, tomorrow_form(vec![TimeOfDay::Morning, TimeOfDay::Evening]))
                .unwrap();
        state
            .db()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_insert BEFORE INSERT ON reminders
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = edit_reminder_group(
            &state,
            created[0].id.to_string(),
            tomorrow_form(vec![TimeOfDay::Noon]),
        );
        assert!(result.is_err());
        assert_eq!(get_reminder_groups(&state).unwrap()[0].member_ids().len(), 2);
        assert_eq!(scheduler.pending().unwrap().len(), 4);
    }

    #[test]
    fn delete_whole_series() {
        let (state, scheduler) = signed_in();
        let created =
            create_reminders(&state, tomorrow_form(vec![TimeOfDay::Morning, TimeOfDay::Night]))
                .unwrap();
        let removed = delete_reminder(&state, created[1].id.to_string(), true).unwrap();
        assert_eq!(removed, 2);
        assert!(scheduler.pending().unwrap().is_empty());
        assert!(get_reminder_groups(&state).unwrap().is_empty());
    }

    #[test]
    fn invalid_id_is_reported() {
        let (state, _) = signed_in();
        let err = mark_reminder_done(&state, "not-a-uuid".into()).unwrap_err();
        assert!(err.starts_with("Invalid reminder ID"));
    }
}
