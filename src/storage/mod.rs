/// Storage layer for persisting habit data
///
/// This module wraps the single on-device SQLite connection. It owns the
/// connection lifecycle, nested transaction bookkeeping, typed query execution
/// and schema bootstrap. Everything above it talks to the store only through
/// [`Database`].

pub mod database;
pub mod keys;
pub mod migrations;
pub mod query;
pub mod record;
pub mod settings;
pub mod transaction;

// Re-export the main storage types
pub use database::*;
pub use keys::{KeyProvider, StaticKeyProvider};
pub use query::ExecuteResult;
pub use record::Record;
pub use settings::Settings;
pub use transaction::{PhysicalOp, TransactionState};

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store could not be opened; fatal at startup
    #[error("Failed to initialize database: {message}")]
    Initialization {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to create storage directory {path}: {source}")]
    StorageDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The DDL batch failed and was rolled back
    #[error("Failed to initialize database tables: {message}")]
    Schema {
        message: String,
        #[source]
        source: Box<StorageError>,
    },

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("JSON value error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A statement that had to change a row changed none
    #[error("Failed to {operation}: no rows affected")]
    NoRowsAffected { operation: &'static str },
}

impl StorageError {
    pub(crate) fn initialization(message: impl Into<String>, source: rusqlite::Error) -> Self {
        StorageError::Initialization {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn schema(message: impl Into<String>, source: StorageError) -> Self {
        StorageError::Schema {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// The SQLite error code behind this error, if it came from the engine
    pub fn sqlite_code(&self) -> Option<rusqlite::ErrorCode> {
        match self {
            StorageError::Query(e) | StorageError::Initialization { source: e, .. } => {
                e.sqlite_error_code()
            }
            StorageError::Schema { source, .. } => source.sqlite_code(),
            _ => None,
        }
    }
}
