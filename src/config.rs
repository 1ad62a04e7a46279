use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

/// Application-level constants
pub const APP_NAME: &str = "MigraineDiary";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Page size shared by the pain-entry and context-note timeline queries.
pub const TIMELINE_PAGE_SIZE: u32 = 20;

/// Maximum characters in a context note.
pub const NOTE_MAX_CHARS: usize = 2000;

/// Maximum number of pre-notification lead times per reminder.
pub const MAX_NOTIFY_OFFSETS: usize = 4;

/// Longest follow-up interval a reminder may carry: one leap year.
pub const MAX_FOLLOW_UP_MINUTES: i64 = 366 * 24 * 60;

/// Rolling relevance window for medication reminders.
pub const MEDICATION_WINDOW_HOURS: i64 = 24;

/// Rolling relevance window for appointment reminders.
pub const APPOINTMENT_WINDOW_HOURS: i64 = 48;

/// Debounce delay applied to search input before a query is issued.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Offset of the reference time zone used for calendar-day decisions
/// (timeline buckets, "due today"). Central European Time.
pub const REFERENCE_UTC_OFFSET_SECS: i32 = 3600;

/// Default `RUST_LOG` filter when the environment does not provide one.
pub fn default_log_filter() -> &'static str {
    "migraine_diary_lib=info,warn"
}

/// Get the application data directory
/// ~/MigraineDiary/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Location of the local diary database.
pub fn database_path() -> PathBuf {
    app_data_dir().join("database").join("diary.db")
}

/// Directory receiving generated PDF reports.
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

/// Runtime settings threaded through the engines.
#[derive(Debug, Clone, Copy)]
pub struct DiaryConfig {
    pub reference_zone: FixedOffset,
    pub page_size: u32,
    pub medication_window_hours: i64,
    pub appointment_window_hours: i64,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            reference_zone: reference_zone(),
            page_size: TIMELINE_PAGE_SIZE,
            medication_window_hours: MEDICATION_WINDOW_HOURS,
            appointment_window_hours: APPOINTMENT_WINDOW_HOURS,
        }
    }
}

/// The fixed zone calendar dates are taken in, independent of client locale.
pub fn reference_zone() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn database_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("diary.db"));
    }

    #[test]
    fn exports_under_app_data() {
        assert!(exports_dir().starts_with(app_data_dir()));
    }

    #[test]
    fn reference_zone_is_one_hour_east() {
        assert_eq!(reference_zone().local_minus_utc(), 3600);
    }

    #[test]
    fn default_config_uses_constants() {
        let cfg = DiaryConfig::default();
        assert_eq!(cfg.page_size, TIMELINE_PAGE_SIZE);
        assert_eq!(cfg.medication_window_hours, 24);
        assert_eq!(cfg.appointment_window_hours, 48);
    }
}
