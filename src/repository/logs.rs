/// Completion log operations
///
/// The store enforces the log invariants: one log per habit per day, and no
/// log without an existing habit. Violations come back as statement errors.

use chrono::NaiveDate;
use rusqlite::types::Value;
use tracing::{debug, error};

use crate::domain::{HabitId, HabitLog, LogId, NewHabitLog};
use crate::repository::{HabitRepository, RepositoryError};
use crate::storage::StorageError;

fn date_param(date: NaiveDate) -> Value {
    Value::from(date.format("%Y-%m-%d").to_string())
}

impl HabitRepository {
    /// Record that a habit was completed on a day
    pub async fn log_completion(&self, log: NewHabitLog) -> Result<LogId, RepositoryError> {
        if self.db.is_closed().await {
            return Ok(0);
        }

        let params = vec![
            Value::from(log.habit_id),
            date_param(log.completed_date),
            Value::from(log.notes),
        ];

        let result: Result<LogId, StorageError> = async {
            self.db.transaction_start().await?;

            let outcome = self
                .db
                .execute(
                    "INSERT INTO logs (habit_id, completed_date, notes) VALUES (?1, ?2, ?3)",
                    &params,
                )
                .await?;

            if outcome.changes == 0 {
                return Err(StorageError::NoRowsAffected {
                    operation: "insert log",
                });
            }

            self.db.transaction_end().await?;
            Ok(outcome.last_insert_id)
        }
        .await;

        match result {
            Ok(id) => {
                debug!(
                    "Logged habit {} for {}",
                    log.habit_id, log.completed_date
                );
                Ok(id)
            }
            Err(e) => {
                self.rollback("log completion").await;
                error!("Error logging completion: {}", e);
                Err(RepositoryError::new("log completion", e))
            }
        }
    }

    /// Logs for one habit, most recent day first
    pub async fn get_logs_for_habit(&self, habit_id: HabitId) -> Result<Vec<HabitLog>, RepositoryError> {
        self.db
            .query_as::<HabitLog>(
                "SELECT id, habit_id, completed_date, notes, created_at
                 FROM logs WHERE habit_id = ?1
                 ORDER BY completed_date DESC",
                &[Value::from(habit_id)],
            )
            .await
            .map_err(|e| {
                error!("Error getting logs: {}", e);
                RepositoryError::new("get logs", e)
            })
    }

    /// Delete the log for one day
    pub async fn remove_log(&self, habit_id: HabitId, date: NaiveDate) -> Result<bool, RepositoryError> {
        let outcome = self
            .db
            .execute(
                "DELETE FROM logs WHERE habit_id = ?1 AND completed_date = ?2",
                &[Value::from(habit_id), date_param(date)],
            )
            .await
            .map_err(|e| {
                error!("Error removing log: {}", e);
                RepositoryError::new("remove log", e)
            })?;

        Ok(outcome.changes > 0)
    }
}
