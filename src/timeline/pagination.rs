use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::merge::merge;
use super::types::{SourceCounts, TimelineItem};
use crate::db::{
    count_context_notes, count_pain_entries, fetch_context_notes_page, fetch_pain_entries_page,
    DatabaseError,
};
use crate::models::{ContextNote, PainEntry};

/// Shared page cursor over both timeline sources.
///
/// Each `load_more` fetches page `n` of pain entries and page `n` of notes
/// and keeps them, so the merged view always spans everything loaded so far.
/// A source is exhausted once it returns a short page, or, with known
/// totals, once every counted row was scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePager {
    page_size: u32,
    next_page: u32,
    last_entries: u32,
    last_notes: u32,
    loaded_entries: u32,
    loaded_notes: u32,
    totals: Option<SourceCounts>,
    entries: Vec<PainEntry>,
    notes: Vec<ContextNote>,
}

impl TimelinePager {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            next_page: 0,
            last_entries: 0,
            last_notes: 0,
            loaded_entries: 0,
            loaded_notes: 0,
            totals: None,
            entries: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Count-aware variant: a full page whose rows reach the known total
    /// still ends that source.
    pub fn with_totals(page_size: u32, totals: SourceCounts) -> Self {
        Self {
            totals: Some(totals),
            ..Self::new(page_size)
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Zero-based page the next `load_more` will fetch.
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn has_more(&self) -> bool {
        if self.next_page == 0 {
            return true;
        }
        let entries_left = self.source_has_more(
            self.last_entries,
            self.loaded_entries,
            self.totals.map(|t| t.pain_entries),
        );
        let notes_left = self.source_has_more(
            self.last_notes,
            self.loaded_notes,
            self.totals.map(|t| t.context_notes),
        );
        entries_left || notes_left
    }

    fn source_has_more(&self, last: u32, loaded: u32, total: Option<u32>) -> bool {
        last >= self.page_size && total.map_or(true, |t| loaded < t)
    }

    /// Advances the cursor. Counts are rows scanned per source, malformed
    /// rows included, so they line up with the store totals.
    pub fn record_page(&mut self, entries: usize, notes: usize) {
        self.last_entries = to_u32(entries);
        self.last_notes = to_u32(notes);
        self.loaded_entries = self.loaded_entries.saturating_add(self.last_entries);
        self.loaded_notes = self.loaded_notes.saturating_add(self.last_notes);
        self.next_page += 1;
    }

    /// Everything loaded so far, merged most recent first.
    pub fn items(&self) -> Vec<TimelineItem> {
        merge(self.entries.clone(), self.notes.clone())
    }

    /// Back to the first page, e.g. after pull-to-refresh. Drops loaded items.
    pub fn reset(&mut self) {
        *self = Self {
            totals: self.totals,
            ..Self::new(self.page_size)
        };
    }

    pub fn set_totals(&mut self, totals: SourceCounts) {
        self.totals = Some(totals);
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Fetches the next shared page and returns the merged view over every
/// page loaded so far.
///
/// Once `has_more` is false the store is not touched and the view is
/// returned unchanged.
pub fn load_more(
    conn: &Connection,
    user_id: &Uuid,
    pager: &mut TimelinePager,
) -> Result<Vec<TimelineItem>, DatabaseError> {
    if !pager.has_more() {
        return Ok(pager.items());
    }
    let page = pager.next_page();
    let entries = fetch_pain_entries_page(conn, user_id, page, pager.page_size())?;
    let notes = fetch_context_notes_page(conn, user_id, page, pager.page_size())?;
    tracing::debug!(
        page,
        entries = entries.rows.len(),
        notes = notes.rows.len(),
        skipped = entries.scanned + notes.scanned - entries.rows.len() - notes.rows.len(),
        "Loaded timeline page"
    );
    pager.record_page(entries.scanned, notes.scanned);
    pager.entries.extend(entries.rows);
    pager.notes.extend(notes.rows);
    Ok(pager.items())
}

/// Reads both source totals for the count-aware pager.
pub fn source_counts(conn: &Connection, user_id: &Uuid) -> Result<SourceCounts, DatabaseError> {
    Ok(SourceCounts {
        pain_entries: count_pain_entries(conn, user_id)?,
        context_notes: count_context_notes(conn, user_id)?,
    })
}
