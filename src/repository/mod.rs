/// Habit repository and the service boundary used by the presentation layer
///
/// The UI never sees SQL. It talks to a [`HabitService`], implemented here by
/// [`HabitRepository`] on top of the shared [`Database`]. Mutating operations
/// run inside a transaction scope and roll it back before reporting a failure.

pub mod habits;
pub mod logs;
pub mod update;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;

use crate::domain::{Habit, HabitChanges, HabitId, HabitLog, LogId, NewHabit, NewHabitLog};
use crate::storage::{Database, StorageError};

/// A failed repository operation, wrapping the root cause
#[derive(Error, Debug)]
#[error("Failed to {action}: {source}")]
pub struct RepositoryError {
    action: &'static str,
    #[source]
    source: StorageError,
}

impl RepositoryError {
    pub(crate) fn new(action: &'static str, source: StorageError) -> Self {
        Self { action, source }
    }

    /// What was being attempted, e.g. "add habit"
    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn storage_error(&self) -> &StorageError {
        &self.source
    }
}

/// Operations the presentation layer may invoke
#[async_trait]
pub trait HabitService: Send + Sync {
    /// Create a habit, filling defaults for absent fields; returns the new id
    async fn add_habit(&self, habit: NewHabit) -> Result<HabitId, RepositoryError>;

    /// Active habits, newest first
    async fn get_active_habits(&self) -> Result<Vec<Habit>, RepositoryError>;

    async fn get_habit_by_id(&self, id: HabitId) -> Result<Option<Habit>, RepositoryError>;

    /// Apply a partial update; returns whether a row was affected
    async fn update_habit(&self, id: HabitId, changes: HabitChanges) -> Result<bool, RepositoryError>;

    /// Soft delete; returns whether a row was affected
    async fn deactivate_habit(&self, id: HabitId) -> Result<bool, RepositoryError>;

    /// Record a completion for one day; returns the new log id
    async fn log_completion(&self, log: NewHabitLog) -> Result<LogId, RepositoryError>;

    /// Completion logs for a habit, most recent day first
    async fn get_logs_for_habit(&self, habit_id: HabitId) -> Result<Vec<HabitLog>, RepositoryError>;

    /// Remove the completion for one day; returns whether a log existed
    async fn remove_log(&self, habit_id: HabitId, date: NaiveDate) -> Result<bool, RepositoryError>;
}

/// SQLite-backed habit repository
#[derive(Clone)]
pub struct HabitRepository {
    db: Arc<Database>,
}

impl HabitRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Undo the current transaction scope after a failure
    ///
    /// The original failure is what the caller reports, so a rollback error
    /// is only logged.
    async fn rollback(&self, action: &'static str) {
        if let Err(e) = self.db.transaction_rollback().await {
            warn!("Rollback after failed {} also failed: {}", action, e);
        }
    }
}

#[async_trait]
impl HabitService for HabitRepository {
    async fn add_habit(&self, habit: NewHabit) -> Result<HabitId, RepositoryError> {
        HabitRepository::add_habit(self, habit).await
    }

    async fn get_active_habits(&self) -> Result<Vec<Habit>, RepositoryError> {
        HabitRepository::get_active_habits(self).await
    }

    async fn get_habit_by_id(&self, id: HabitId) -> Result<Option<Habit>, RepositoryError> {
        HabitRepository::get_habit_by_id(self, id).await
    }

    async fn update_habit(&self, id: HabitId, changes: HabitChanges) -> Result<bool, RepositoryError> {
        HabitRepository::update_habit(self, id, changes).await
    }

    async fn deactivate_habit(&self, id: HabitId) -> Result<bool, RepositoryError> {
        HabitRepository::deactivate_habit(self, id).await
    }

    async fn log_completion(&self, log: NewHabitLog) -> Result<LogId, RepositoryError> {
        HabitRepository::log_completion(self, log).await
    }

    async fn get_logs_for_habit(&self, habit_id: HabitId) -> Result<Vec<HabitLog>, RepositoryError> {
        HabitRepository::get_logs_for_habit(self, habit_id).await
    }

    async fn remove_log(&self, habit_id: HabitId, date: NaiveDate) -> Result<bool, RepositoryError> {
        HabitRepository::remove_log(self, habit_id, date).await
    }
}
