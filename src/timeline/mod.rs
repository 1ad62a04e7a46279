//! Diary timeline: pain entries and context notes merged into one
//! chronological, date-grouped feed with shared-page pagination.

mod merge;
mod pagination;
mod types;

pub use merge::*;
pub use pagination::*;
pub use types::*;
