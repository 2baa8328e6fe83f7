/// Habit CRUD operations
///
/// The repository does not validate input; that is the screen's job. It only
/// supplies defaults, wraps mutations in a transaction, and reports failures
/// with the operation that failed.

use rusqlite::types::Value;
use tracing::{debug, error};

use crate::domain::{Habit, HabitChanges, HabitId, NewHabit, DEFAULT_COLOR, DEFAULT_TARGET_DAYS};
use crate::repository::update::{advance_timestamp, habit_update_statement};
use crate::repository::{HabitRepository, RepositoryError};
use crate::storage::StorageError;

const HABIT_COLUMNS: &str = "id, name, description, color, icon, frequency, target_days, \
                             created_at, updated_at, is_active";

impl HabitRepository {
    /// Insert a habit and return its store-assigned id
    ///
    /// After the database is closed this returns id `0` without touching anything.
    pub async fn add_habit(&self, habit: NewHabit) -> Result<HabitId, RepositoryError> {
        if self.db.is_closed().await {
            debug!("Database closed, not adding habit '{}'", habit.name);
            return Ok(0);
        }

        let params = vec![
            Value::from(habit.name.clone()),
            Value::from(habit.description),
            Value::from(habit.color.unwrap_or_else(|| DEFAULT_COLOR.to_string())),
            Value::from(habit.icon),
            Value::from(habit.frequency.unwrap_or_default().as_str().to_string()),
            Value::from(habit.target_days.unwrap_or(DEFAULT_TARGET_DAYS)),
            Value::from(habit.is_active.unwrap_or(true)),
        ];

        let result: Result<HabitId, StorageError> = async {
            self.db.transaction_start().await?;

            let outcome = self
                .db
                .execute(
                    "INSERT INTO habits (
                        name, description, color, icon, frequency, target_days, is_active
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    &params,
                )
                .await?;

            if outcome.changes == 0 {
                return Err(StorageError::NoRowsAffected {
                    operation: "insert habit",
                });
            }

            self.db.transaction_end().await?;
            Ok(outcome.last_insert_id)
        }
        .await;

        match result {
            Ok(id) => {
                debug!("Created habit: {} ({})", habit.name, id);
                Ok(id)
            }
            Err(e) => {
                self.rollback("add habit").await;
                error!("Error adding habit: {}", e);
                Err(RepositoryError::new("add habit", e))
            }
        }
    }

    /// All active habits, newest first
    pub async fn get_active_habits(&self) -> Result<Vec<Habit>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM habits WHERE is_active = 1 ORDER BY created_at DESC, id DESC",
            HABIT_COLUMNS
        );

        self.db.query_as::<Habit>(&sql, &[]).await.map_err(|e| {
            error!("Error getting active habits: {}", e);
            RepositoryError::new("get habits", e)
        })
    }

    /// One habit, active or not; a missing id is `None`
    pub async fn get_habit_by_id(&self, id: HabitId) -> Result<Option<Habit>, RepositoryError> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS);

        self.db
            .query_one_as::<Habit>(&sql, &[Value::from(id)])
            .await
            .map_err(|e| {
                error!("Error getting habit by ID: {}", e);
                RepositoryError::new("get habit", e)
            })
    }

    /// Write only the supplied fields and refresh `updated_at`
    ///
    /// With no fields supplied nothing is written and the call succeeds.
    pub async fn update_habit(&self, id: HabitId, changes: HabitChanges) -> Result<bool, RepositoryError> {
        if self.db.is_closed().await {
            return Ok(false);
        }

        let result: Result<bool, StorageError> = async {
            self.db.transaction_start().await?;

            if changes.is_empty() {
                self.db.transaction_end().await?;
                return Ok(true);
            }

            let (sql, params) = habit_update_statement(id, &changes);
            let outcome = self.db.execute(&sql, &params).await?;

            self.db.transaction_end().await?;
            Ok(outcome.changes > 0)
        }
        .await;

        match result {
            Ok(updated) => {
                debug!("Updated habit {}: {}", id, updated);
                Ok(updated)
            }
            Err(e) => {
                self.rollback("update habit").await;
                error!("Error updating habit: {}", e);
                Err(RepositoryError::new("update habit", e))
            }
        }
    }

    /// Soft delete (mark as inactive)
    ///
    /// A single statement is atomic on its own, so no transaction scope is opened.
    pub async fn deactivate_habit(&self, id: HabitId) -> Result<bool, RepositoryError> {
        let sql = format!(
            "UPDATE habits SET is_active = 0, updated_at = {} WHERE id = ?1",
            advance_timestamp("updated_at")
        );

        let outcome = self
            .db
            .execute(&sql, &[Value::from(id)])
            .await
            .map_err(|e| {
                error!("Error deactivating habit: {}", e);
                RepositoryError::new("deactivate habit", e)
            })?;

        debug!("Soft deleted habit: {}", id);
        Ok(outcome.changes > 0)
    }
}
