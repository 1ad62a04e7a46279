//! Reminder engine: relevance views, series grouping, scheduling arithmetic
//! and notification sync.

mod grouping;
mod notify;
mod relevance;
mod schedule;

pub use grouping::*;
pub use notify::*;
pub use relevance::*;
pub use schedule::*;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}
