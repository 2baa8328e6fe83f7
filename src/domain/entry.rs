/// HabitLog entity for tracking habit completions
///
/// A log records that a habit was completed on a given calendar day. The store
/// keeps at most one log per habit per date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HabitId, LogId};

/// A completion record as persisted in the `logs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: LogId,
    pub habit_id: HabitId,
    /// The day the habit was completed for (may differ from `created_at`)
    pub completed_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when logging a completion
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabitLog {
    pub habit_id: HabitId,
    pub completed_date: NaiveDate,
    pub notes: Option<String>,
}

impl NewHabitLog {
    pub fn new(habit_id: HabitId, completed_date: NaiveDate) -> Self {
        Self {
            habit_id,
            completed_date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
