/// Key-value app settings
///
/// Small preferences (language, theme, last opened screen) live in the
/// `settings` table next to the habit data. Values are stored as JSON text so
/// any `serde` type can be kept under a key. A stored value that no longer
/// decodes as the requested type reads as absent.

use std::sync::Arc;

use rusqlite::types::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::storage::{Database, StorageError};

#[derive(Clone)]
pub struct Settings {
    db: Arc<Database>,
}

impl Settings {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store `value` under `key`, replacing any previous value
    ///
    /// A value that serializes to `null` (e.g. `None`) removes the key instead.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_value(value)?;
        if json.is_null() {
            self.delete(key).await?;
            return Ok(());
        }

        self.db
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                &[Value::from(key.to_string()), Value::from(json.to_string())],
            )
            .await?;

        debug!(key, "Stored setting");
        Ok(())
    }

    /// The value under `key`, or `None` if it is missing or does not decode as `T`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let stored = self
            .db
            .query_scalar(
                "SELECT value FROM settings WHERE key = ?1",
                &[Value::from(key.to_string())],
            )
            .await?;

        let Some(Value::Text(text)) = stored else {
            return Ok(None);
        };

        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, "Ignoring setting that does not decode: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Remove `key`; returns whether it was set
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let outcome = self
            .db
            .execute(
                "DELETE FROM settings WHERE key = ?1",
                &[Value::from(key.to_string())],
            )
            .await?;
        Ok(outcome.changes > 0)
    }

    /// Remove every setting, returning how many there were
    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        let outcome = self.db.execute("DELETE FROM settings", &[]).await?;
        debug!(removed = outcome.changes, "Cleared settings");
        Ok(outcome.changes)
    }

    /// Every stored key, sorted
    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = self
            .db
            .query_column("SELECT key FROM settings ORDER BY key", &[])
            .await?;

        Ok(keys
            .into_iter()
            .filter_map(|key| match key {
                Value::Text(key) => Some(key),
                _ => None,
            })
            .collect())
    }
}
