/// Habit entity and related functionality
///
/// This module defines the stored `Habit` record, the `NewHabit` input used to
/// create one, and the `HabitChanges` partial update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::sqlite_bool;
use crate::domain::{DomainError, Frequency, HabitId};

/// Longest habit name the UI accepts; the store itself does not enforce it
pub const MAX_NAME_LEN: usize = 50;

/// A habit as persisted in the `habits` table
///
/// Every field is store-managed once the row exists: `id` never changes after
/// assignment, and `updated_at` advances on each mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    /// Display name (e.g., "Drink water")
    pub name: String,
    pub description: Option<String>,
    /// Hex-like color string, `#007AFF` unless chosen
    pub color: String,
    /// Optional short glyph shown next to the name
    pub icon: Option<String>,
    pub frequency: Frequency,
    pub target_days: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft deletion flag; inactive habits stay in storage
    #[serde(deserialize_with = "sqlite_bool")]
    pub is_active: bool,
}

/// Fields supplied when creating a habit
///
/// Anything left as `None` is filled with the store default by the repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub frequency: Option<Frequency>,
    pub target_days: Option<u32>,
    pub is_active: Option<bool>,
}

impl NewHabit {
    /// Start a new habit with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A partial update to a habit
///
/// Only `Some` fields are written. The nullable columns use a nested option so
/// that `Some(None)` clears the column while `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub icon: Option<Option<String>>,
    pub frequency: Option<Frequency>,
    pub target_days: Option<u32>,
    pub is_active: Option<bool>,
}

impl HabitChanges {
    /// True when no field would be written
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.icon.is_none()
            && self.frequency.is_none()
            && self.target_days.is_none()
            && self.is_active.is_none()
    }
}

/// Validate a habit name the way the add/edit screens do
///
/// The repository accepts any string; this check belongs to the presentation side.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(DomainError::InvalidHabitName(
            "Habit name cannot be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidHabitName(format!(
            "Habit name cannot be longer than {} characters",
            MAX_NAME_LEN
        )));
    }

    Ok(())
}
