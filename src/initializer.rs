/// Startup sequence for the store
///
/// `initialize()` must complete once before any repository call. It creates
/// the storage directory, opens the connection, and creates the schema if the
/// catalog is missing any required table. The last failure is kept so a
/// screen shown after a failed start can explain what went wrong.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::storage::{migrations, Database, StorageError};

pub struct Initializer {
    db: Arc<Database>,
    last_error: Mutex<Option<String>>,
}

impl Initializer {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            last_error: Mutex::new(None),
        }
    }

    /// Prepare the store for use
    ///
    /// Any failure here is fatal: the application should not start. A later
    /// successful run clears the recorded failure.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        let result = self.bootstrap().await;

        let mut last_error = self.last_error.lock().await;
        match &result {
            Ok(()) => {
                *last_error = None;
                info!("Database initialized");
            }
            Err(e) => {
                error!("Database initialization failed: {}", e);
                *last_error = Some(e.to_string());
            }
        }
        result
    }

    /// Why the most recent `initialize()` failed, if it did
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    /// Drop every table and recreate the schema from scratch
    ///
    /// Settings live in the same store, so they are cleared as well.
    pub async fn reset(&self) -> Result<(), StorageError> {
        migrations::drop_all_tables(&self.db).await?;
        migrations::create_schema(&self.db).await?;
        info!("Database reset");
        Ok(())
    }

    async fn bootstrap(&self) -> Result<(), StorageError> {
        self.ensure_storage_dir()?;
        self.db.prepare().await?;

        if migrations::needs_initialization(&self.db, migrations::REQUIRED_TABLES).await {
            migrations::create_schema(&self.db).await?;
        }
        Ok(())
    }

    /// The directory has to exist before the connection is opened
    fn ensure_storage_dir(&self) -> Result<(), StorageError> {
        let Some(dir) = self.db.path().and_then(|path| path.parent()) else {
            return Ok(());
        };

        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::StorageDirectory {
                path: dir.display().to_string(),
                source,
            })?;
            info!("Created storage directory: {}", dir.display());
        }
        Ok(())
    }
}
