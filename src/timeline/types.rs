use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ContextNote, PainEntry};

/// One row of the merged timeline. Built fresh for every view, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TimelineItem {
    PainEntry(PainEntry),
    ContextNote(ContextNote),
}

impl TimelineItem {
    /// Instant the item is ordered by.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PainEntry(e) => e.started_at,
            Self::ContextNote(n) => n.occurred_at,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::PainEntry(e) => e.id,
            Self::ContextNote(n) => n.id,
        }
    }

    pub fn is_pain_entry(&self) -> bool {
        matches!(self, Self::PainEntry(_))
    }
}

/// Items that fall on one calendar day of the reference zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub items: Vec<TimelineItem>,
}

/// Known totals per source, used by the count-aware pager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub pain_entries: u32,
    pub context_notes: u32,
}
