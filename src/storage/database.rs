/// SQLite connection manager
///
/// [`Database`] owns the one connection to the store file. The connection is
/// opened lazily on first use, configured once per open, and closed exactly
/// once; after `close()` every operation is a no-op that returns an empty or
/// zero result instead of failing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::storage::{KeyProvider, StaticKeyProvider, StorageError, TransactionState};

/// File name of the store inside the data directory
pub const DEFAULT_FILE_NAME: &str = "habity.db";

/// Memory-mapped I/O size applied on every open (256 MiB)
pub const DEFAULT_MMAP_SIZE: i64 = 268_435_456;

/// Where and how the store is opened
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
    pub mmap_size: i64,
}

impl DatabaseConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            mmap_size: DEFAULT_MMAP_SIZE,
        }
    }

    /// Full path of the store file
    pub fn path(&self) -> PathBuf {
        resolve_path(&self.data_dir, &self.file_name)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

/// Compute the store location from the platform data directory and a relative file name
pub fn resolve_path(data_dir: &Path, file_name: &str) -> PathBuf {
    data_dir.join(file_name)
}

/// Get the platform data directory with a fallback strategy
///
/// Candidates are tried in order and the first one that can be created and
/// written to wins; the temporary directory is the last resort.
pub fn default_data_dir() -> PathBuf {
    let candidates = [
        dirs::data_dir().map(|p| p.join("habity")),
        dirs::home_dir().map(|p| p.join(".habity")),
        std::env::current_dir().ok().map(|p| p.join(".habity")),
    ];

    for candidate in candidates.iter().flatten() {
        if std::fs::create_dir_all(candidate).is_ok() {
            let probe = candidate.join(".write_test");
            if std::fs::write(&probe, b"ok").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return candidate.clone();
            }
        }
    }

    let fallback = std::env::temp_dir().join("habity");
    warn!("Using temporary directory for database: {}", fallback.display());
    fallback
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Mutable connection state, always accessed under one lock
#[derive(Default)]
pub(crate) struct State {
    pub(crate) conn: Option<Connection>,
    pub(crate) closed: bool,
    pub(crate) tx: TransactionState,
}

/// The single store connection and its lifecycle
pub struct Database {
    location: Location,
    mmap_size: i64,
    keys: Arc<dyn KeyProvider>,
    pub(crate) state: Mutex<State>,
}

impl Database {
    /// Create a manager for the store described by `config`; nothing is opened yet
    pub fn new(config: &DatabaseConfig, keys: Arc<dyn KeyProvider>) -> Self {
        Self {
            location: Location::File(config.path()),
            mmap_size: config.mmap_size,
            keys,
            state: Mutex::new(State::default()),
        }
    }

    /// Create a manager for a private in-memory store (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            mmap_size: DEFAULT_MMAP_SIZE,
            keys: Arc::new(StaticKeyProvider::default()),
            state: Mutex::new(State::default()),
        }
    }

    /// Path of the store file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    /// Make sure the connection is open
    ///
    /// Idempotent. A failed open leaves the manager unopened so a later call can retry.
    pub async fn prepare(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        self.open_if_needed(&mut state)
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.conn.is_some()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    /// Shut the store down for good
    ///
    /// Pending transaction scopes are committed on a best-effort basis, falling
    /// back to a rollback. The handle is released and the manager stays closed
    /// even if that fails. Calling `close` again does nothing.
    pub async fn close(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        state.closed = true;

        let pending = state.tx.reset();
        let Some(conn) = state.conn.take() else {
            info!("Database closed before it was opened");
            return Ok(());
        };

        if pending > 0 && !conn.is_autocommit() {
            warn!(pending, "Closing database with open transaction scopes, committing");
            if let Err(e) = conn.execute_batch("COMMIT") {
                warn!("Commit on close failed, rolling back: {}", e);
                if let Err(e) = conn.execute_batch("ROLLBACK") {
                    error!("Rollback on close failed: {}", e);
                }
            }
        }

        conn.close().map_err(|(_, e)| {
            error!("Failed to close database: {}", e);
            StorageError::Query(e)
        })?;

        info!("Database closed");
        Ok(())
    }

    /// The open connection, or `None` once the manager is closed
    pub(crate) fn ready<'a>(&self, state: &'a mut State) -> Result<Option<&'a Connection>, StorageError> {
        if state.closed {
            return Ok(None);
        }
        self.open_if_needed(state)?;
        Ok(state.conn.as_ref())
    }

    pub(crate) fn open_if_needed(&self, state: &mut State) -> Result<(), StorageError> {
        if state.conn.is_none() {
            state.conn = Some(self.open_connection()?);
        }
        Ok(())
    }

    fn open_connection(&self) -> Result<Connection, StorageError> {
        let conn = match &self.location {
            Location::File(path) => Connection::open(path),
            Location::Memory => Connection::open_in_memory(),
        }
        .map_err(|e| {
            error!("Failed to open database: {}", e);
            StorageError::initialization("Failed to open database", e)
        })?;

        self.configure(&conn).map_err(|e| {
            error!("Failed to configure database: {}", e);
            StorageError::initialization("Failed to configure database", e)
        })?;

        match &self.location {
            Location::File(path) => info!("Opened database at: {}", path.display()),
            Location::Memory => info!("Opened in-memory database"),
        }
        Ok(conn)
    }

    /// Per-open pragmas; the key has to come first
    fn configure(&self, conn: &Connection) -> rusqlite::Result<()> {
        let key = self.keys.database_key();
        run_pragma(conn, &format!("PRAGMA key = '{}'", key.replace('\'', "''")))?;

        // Fails here rather than on first query when the key or file is wrong
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        run_pragma(conn, "PRAGMA foreign_keys = ON")?;
        run_pragma(conn, &format!("PRAGMA mmap_size = {}", self.mmap_size))?;
        debug!(mmap_size = self.mmap_size, "Applied connection pragmas");
        Ok(())
    }
}

/// Run a pragma, discarding whatever rows it reports back
fn run_pragma(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    while rows.next()?.is_some() {}
    Ok(())
}
