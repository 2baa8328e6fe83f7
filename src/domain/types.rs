/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier aliases and the `Frequency` enum shared by
/// habits and the storage layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::DomainError;

/// Identity of a habit row, assigned by the store (`INTEGER PRIMARY KEY AUTOINCREMENT`)
pub type HabitId = i64;

/// Identity of a habit log row
pub type LogId = i64;

/// Color used when a habit is created without one
pub const DEFAULT_COLOR: &str = "#007AFF";

/// Target used when a habit is created without one
pub const DEFAULT_TARGET_DAYS: u32 = 1;

/// How often a habit should be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// The text stored in the `frequency` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(DomainError::InvalidFrequency(format!(
                "'{}'. Valid options: daily, weekly, monthly",
                other
            ))),
        }
    }
}

/// Deserialize a SQLite boolean, which comes back from the store as an integer
pub(crate) fn sqlite_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
    }
}
