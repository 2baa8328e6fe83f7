/// Public library interface for Habity
///
/// This module exports the persistence layer and the `Habity` composition root,
/// which wires one database to its initializer, the habit repository and the
/// settings store for the lifetime of the process.

use std::sync::Arc;

use thiserror::Error;

// Internal modules
mod domain;
mod initializer;
mod repository;
pub mod storage;

// Re-export public modules and types
pub use domain::*;
pub use initializer::Initializer;
pub use repository::update::{habit_update, UpdateBuilder};
pub use repository::{HabitRepository, HabitService, RepositoryError};
pub use storage::{
    resolve_path, Database, DatabaseConfig, ExecuteResult, KeyProvider, Record, Settings,
    StaticKeyProvider, StorageError,
};

/// Errors that can occur during application operation
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid input: {0}")]
    Domain(#[from] DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process-scoped owner of the store and the services built on it
///
/// Create one at startup, call [`Habity::initialize`], hand [`Habity::habits`]
/// to the presentation layer, and [`Habity::shutdown`] on exit.
pub struct Habity {
    database: Arc<Database>,
    initializer: Initializer,
    habits: HabitRepository,
    settings: Settings,
}

impl Habity {
    /// Wire up the store at the configured location with the default key
    pub fn new(config: DatabaseConfig) -> Self {
        Self::with_key_provider(config, Arc::new(StaticKeyProvider::default()))
    }

    pub fn with_key_provider(config: DatabaseConfig, keys: Arc<dyn KeyProvider>) -> Self {
        Self::from_database(Arc::new(Database::new(&config, keys)))
    }

    pub fn from_database(database: Arc<Database>) -> Self {
        Self {
            initializer: Initializer::new(database.clone()),
            habits: HabitRepository::new(database.clone()),
            settings: Settings::new(database.clone()),
            database,
        }
    }

    /// Open the store and make sure the schema exists
    pub async fn initialize(&self) -> Result<(), AppError> {
        tracing::info!("Initializing Habity with database: {:?}", self.database.path());
        self.initializer.initialize().await?;
        Ok(())
    }

    /// The service boundary for the presentation layer
    pub fn habits(&self) -> &HabitRepository {
        &self.habits
    }

    /// Key-value app preferences kept in the same store
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    pub fn initializer(&self) -> &Initializer {
        &self.initializer
    }

    /// Close the store; every later call becomes a no-op
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.database.close().await?;
        Ok(())
    }
}
