/// Domain module containing the habit tracking data types
///
/// This module defines the entities (Habit, HabitLog), the inputs used to create
/// and change them, and the validation the presentation layer applies before
/// calling into the repository.

pub mod habit;
pub mod entry;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use entry::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur while interpreting user input
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
