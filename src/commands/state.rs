use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{self, DiaryConfig};
use crate::db::{self, DatabaseError};
use crate::reminders::{InMemoryScheduler, NotificationScheduler};
use crate::timeline::TimelinePager;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("No user signed in")]
    NoActiveUser,

    #[error("Internal lock error")]
    LockPoisoned,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Application state shared by all commands.
/// Holds the store connection, the signed-in user and the timeline cursor.
pub struct AppState {
    conn: Mutex<Connection>,
    active_user: RwLock<Option<Uuid>>,
    timeline: Mutex<TimelinePager>,
    pub config: DiaryConfig,
    pub scheduler: Arc<dyn NotificationScheduler>,
    pub exports_dir: PathBuf,
}

impl AppState {
    /// Opens (and migrates) the store at `path`.
    pub fn open(path: &Path, config: DiaryConfig) -> Result<Self, DatabaseError> {
        let conn = db::open_database(path)?;
        Ok(Self::with_connection(conn, config))
    }

    /// Store under the default application data directory.
    pub fn open_default() -> Result<Self, DatabaseError> {
        Self::open(&config::database_path(), DiaryConfig::default())
    }

    pub fn in_memory(config: DiaryConfig) -> Result<Self, DatabaseError> {
        Ok(Self::with_connection(db::open_memory_database()?, config))
    }

    fn with_connection(conn: Connection, config: DiaryConfig) -> Self {
        Self {
            conn: Mutex::new(conn),
            active_user: RwLock::new(None),
            timeline: Mutex::new(TimelinePager::new(config.page_size)),
            config,
            scheduler: Arc::new(InMemoryScheduler::new()),
            exports_dir: config::exports_dir(),
        }
    }

    /// Replaces the notification backend.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_exports_dir(mut self, dir: PathBuf) -> Self {
        self.exports_dir = dir;
        self
    }

    pub fn sign_in(&self, user_id: Uuid) -> Result<(), StateError> {
        let mut user = self.active_user.write().map_err(|_| StateError::LockPoisoned)?;
        *user = Some(user_id);
        self.timeline_pager()?.reset();
        tracing::info!(user_id = %user_id, "User signed in");
        Ok(())
    }

    pub fn sign_out(&self) {
        if let Ok(mut user) = self.active_user.write() {
            *user = None;
        }
        tracing::info!("User signed out");
    }

    /// The signed-in user, or `NoActiveUser`.
    pub fn require_user(&self) -> Result<Uuid, StateError> {
        let user = self.active_user.read().map_err(|_| StateError::LockPoisoned)?;
        user.ok_or(StateError::NoActiveUser)
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, StateError> {
        self.conn.lock().map_err(|_| StateError::LockPoisoned)
    }

    pub fn timeline_pager(&self) -> Result<MutexGuard<'_, TimelinePager>, StateError> {
        self.timeline.lock().map_err(|_| StateError::LockPoisoned)
    }
}
