//! Timeline commands: first page and "load more".

use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::timeline::{self, DayGroup};

/// Day groups over every item loaded since the last refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePage {
    pub days: Vec<DayGroup>,
    pub has_more: bool,
}

/// Restarts pagination from the most recent page.
pub fn refresh_timeline(state: &AppState) -> Result<TimelinePage, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    let totals = timeline::source_counts(&conn, &user_id).map_err(|e| e.to_string())?;

    let mut pager = state.timeline_pager().map_err(|e| e.to_string())?;
    pager.reset();
    pager.set_totals(totals);
    let items = timeline::load_more(&conn, &user_id, &mut pager).map_err(|e| e.to_string())?;

    Ok(TimelinePage {
        days: timeline::group_by_day(&items, &state.config.reference_zone),
        has_more: pager.has_more(),
    })
}

/// Fetches the next shared page of both sources and regroups everything
/// loaded so far, so a day never splits across pages.
pub fn load_more_timeline(state: &AppState) -> Result<TimelinePage, String> {
    let user_id = state.require_user().map_err(|e| e.to_string())?;
    let conn = state.db().map_err(|e| e.to_string())?;
    let mut pager = state.timeline_pager().map_err(|e| e.to_string())?;
    let items = timeline::load_more(&conn, &user_id, &mut pager).map_err(|e| e.to_string())?;

    Ok(TimelinePage {
        days: timeline::group_by_day(&items, &state.config.reference_zone),
        has_more: pager.has_more(),
    })
}
