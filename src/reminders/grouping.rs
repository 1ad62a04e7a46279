use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schedule::ReminderForm;
use crate::db::{delete_reminder, insert_reminder, update_reminder, DatabaseError};
use crate::models::enums::TimeOfDay;
use crate::models::Reminder;
use crate::validation::ValidationError;

/// Reminders of one series shown as a single entity. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderGroup {
    pub series_id: Option<Uuid>,
    pub members: Vec<Reminder>,
}

impl ReminderGroup {
    /// Sort key of the group.
    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.members.iter().filter_map(|r| r.date_time).min()
    }

    pub fn times_of_day(&self) -> BTreeSet<TimeOfDay> {
        self.members.iter().filter_map(|r| r.time_of_day).collect()
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|r| r.id).collect()
    }

    pub fn title(&self) -> &str {
        self.members.first().map(|r| r.title.as_str()).unwrap_or_default()
    }
}

/// Groups reminders by `series_id`; reminders without one stay alone.
/// Groups are ordered by their earliest member, undated groups last.
pub fn group_by_series(reminders: &[Reminder]) -> Vec<ReminderGroup> {
    let mut groups: Vec<ReminderGroup> = Vec::new();
    for reminder in reminders {
        let existing = reminder
            .series_id
            .and_then(|sid| groups.iter_mut().find(|g| g.series_id == Some(sid)));
        match existing {
            Some(group) => group.members.push(reminder.clone()),
            None => groups.push(ReminderGroup {
                series_id: reminder.series_id,
                members: vec![reminder.clone()],
            }),
        }
    }
    for group in &mut groups {
        group.members.sort_by_key(|r| (r.time_of_day, r.date_time));
    }
    groups.sort_by_key(|g| (g.earliest().is_none(), g.earliest()));
    groups
}

/// Store operations realising an edit of a whole group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEditPlan {
    /// Same set of times of day: members keep their ids and status.
    UpdateInPlace { updates: Vec<Reminder> },
    /// Times of day changed: members are replaced by a new series.
    Recreate { delete: Vec<Uuid>, create: Vec<Reminder> },
}

pub fn plan_group_edit(
    group: &ReminderGroup,
    form: &ReminderForm,
    zone: &FixedOffset,
) -> Result<GroupEditPlan, ValidationError> {
    let user_id = group.members.first().map(|r| r.user_id).unwrap_or_default();
    let built = form.build(user_id, zone)?;

    if form.slots() != group.times_of_day() || built.len() != group.members.len() {
        return Ok(GroupEditPlan::Recreate {
            delete: group.member_ids(),
            create: built,
        });
    }

    let updates = built
        .into_iter()
        .zip(group.members.iter())
        .map(|(fresh, member)| Reminder {
            id: member.id,
            series_id: member.series_id,
            status: member.status,
            ..fresh
        })
        .collect();
    Ok(GroupEditPlan::UpdateInPlace { updates })
}

/// Runs the plan in one transaction and returns the resulting reminders.
pub fn apply_group_edit(
    conn: &Connection,
    user_id: &Uuid,
    plan: &GroupEditPlan,
) -> Result<Vec<Reminder>, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let result = match plan {
        GroupEditPlan::UpdateInPlace { updates } => {
            for reminder in updates {
                update_reminder(&tx, reminder)?;
            }
            updates.clone()
        }
        GroupEditPlan::Recreate { delete, create } => {
            for id in delete {
                delete_reminder(&tx, user_id, id)?;
            }
            for reminder in create {
                insert_reminder(&tx, reminder)?;
            }
            create.clone()
        }
    };
    tx.commit()?;
    tracing::info!(count = result.len(), "Applied reminder group edit");
    Ok(result)
}
