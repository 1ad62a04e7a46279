//! Repository layer — entity-scoped database operations.
//!
//! Every query takes the signed-in user's id; rows of other users are never
//! read or written. Instants are stored as RFC 3339 UTC strings with
//! millisecond precision so text order equals chronological order.

mod context_note;
mod medication_course;
mod pain_entry;
mod reminder;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

pub use context_note::*;
pub use medication_course::*;
pub use pain_entry::*;
pub use reminder::*;

/// One page read from a table. `scanned` counts every row the query
/// returned, including malformed rows that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<T> {
    pub rows: Vec<T>,
    pub scanned: usize,
}

/// Canonical storage form of an instant.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored instant; `None` for anything that is not RFC 3339.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}
