/// Database schema management
///
/// This module decides whether the store needs its tables created, and
/// creates them. All DDL for a version runs inside one transaction scope, so a
/// failure leaves no partial schema behind. Every statement is guarded with
/// `IF NOT EXISTS`, which keeps repeated runs harmless.

use rusqlite::types::Value;
use tracing::{error, info, warn};

use crate::storage::{Database, StorageError};

/// Current database schema version, stamped into `PRAGMA user_version`
///
/// Increment this when you add new migrations
pub const CURRENT_VERSION: i64 = 1;

/// Tables the application cannot run without
pub const REQUIRED_TABLES: &[&str] = &["habits", "logs", "settings"];

/// Version 1: habits, their completion logs, app settings, and lookup indexes
const SCHEMA_V1: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS habits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        color TEXT NOT NULL DEFAULT '#007AFF',
        icon TEXT,
        frequency TEXT NOT NULL DEFAULT 'daily'
            CHECK (frequency IN ('daily', 'weekly', 'monthly')),
        target_days INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        is_active BOOLEAN NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        habit_id INTEGER NOT NULL REFERENCES habits (id) ON DELETE CASCADE,
        completed_date TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        UNIQUE (habit_id, completed_date)
    )",
    "CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )",
    // Finding logs by habit and date (most common query)
    "CREATE INDEX IF NOT EXISTS idx_logs_habit_date
     ON logs (habit_id, completed_date)",
    // Listing active habits newest first
    "CREATE INDEX IF NOT EXISTS idx_habits_active_created
     ON habits (is_active, created_at)",
];

/// Check the catalog for the given tables
///
/// Returns `true` when initialization is needed: at least one table is
/// missing, or the catalog could not be read at all.
pub async fn needs_initialization(db: &Database, required: &[&str]) -> bool {
    let existing = match db
        .query_column("SELECT name FROM sqlite_master WHERE type = 'table'", &[])
        .await
    {
        Ok(names) => names,
        Err(e) => {
            warn!("Error checking tables, assuming initialization is needed: {}", e);
            return true;
        }
    };

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|table| {
            !existing
                .iter()
                .any(|name| matches!(name, Value::Text(name) if name == table))
        })
        .collect();

    if missing.is_empty() {
        info!("All required tables exist");
        false
    } else {
        info!("Missing tables: {:?}", missing);
        true
    }
}

/// Create every table and index of the current schema version
pub async fn create_schema(db: &Database) -> Result<(), StorageError> {
    let mut statements: Vec<String> = SCHEMA_V1.iter().map(|s| s.to_string()).collect();
    statements.push(format!("PRAGMA user_version = {}", CURRENT_VERSION));

    run_batch(db, &statements)
        .await
        .map_err(|e| StorageError::schema("schema creation rolled back", e))?;

    info!("Applied migration v{}: created database schema", CURRENT_VERSION);
    Ok(())
}

/// Drop every application table, leaving SQLite's own tables alone
pub async fn drop_all_tables(db: &Database) -> Result<(), StorageError> {
    let tables = db
        .query_column(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            &[],
        )
        .await?;

    let mut statements: Vec<String> = tables
        .iter()
        .filter_map(|name| match name {
            Value::Text(name) => Some(format!("DROP TABLE IF EXISTS \"{}\"", name.replace('"', "\"\""))),
            _ => None,
        })
        .collect();
    statements.push("PRAGMA user_version = 0".to_string());

    // Dropping a parent table must not trip the cascade on half-dropped children
    run_batch_without_foreign_keys(db, &statements)
        .await
        .map_err(|e| StorageError::schema("dropping tables rolled back", e))?;

    info!("Dropped {} tables", tables.len());
    Ok(())
}

/// The schema version recorded in the store, 0 for a fresh file
pub async fn schema_version(db: &Database) -> Result<i64, StorageError> {
    match db.query_scalar("PRAGMA user_version", &[]).await? {
        Some(Value::Integer(version)) => Ok(version),
        _ => Ok(0),
    }
}

/// Run statements inside one transaction scope, rolling all of them back on failure
pub(crate) async fn run_batch(db: &Database, statements: &[String]) -> Result<(), StorageError> {
    db.transaction_start().await?;

    let result: Result<(), StorageError> = async {
        for statement in statements {
            db.execute(statement, &[]).await?;
        }
        db.transaction_end().await
    }
    .await;

    if let Err(e) = result {
        error!("Schema batch failed, rolling back: {}", e);
        if let Err(rollback_err) = db.transaction_rollback().await {
            error!("Schema rollback failed: {}", rollback_err);
        }
        return Err(e);
    }
    Ok(())
}

async fn run_batch_without_foreign_keys(db: &Database, statements: &[String]) -> Result<(), StorageError> {
    // foreign_keys is a no-op inside a transaction, so toggle it around the batch
    db.execute("PRAGMA foreign_keys = OFF", &[]).await?;
    let result = run_batch(db, statements).await;
    db.execute("PRAGMA foreign_keys = ON", &[]).await?;
    result
}
