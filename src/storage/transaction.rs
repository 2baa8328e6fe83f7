/// Nested transaction bookkeeping
///
/// Services call shared helpers that open their own transaction scopes, so
/// scopes nest. [`TransactionState`] counts the open scopes and decides when a
/// physical BEGIN, COMMIT or ROLLBACK has to reach SQLite: exactly one
/// BEGIN/COMMIT pair per outermost scope, whatever the nesting depth.
///
/// Rollback is eager. The first rollback at any depth aborts the whole physical
/// transaction at once, instead of waiting for the depth to drain. The enclosing
/// scopes are still open from their callers' point of view, so the counter only
/// drops by one; those scopes then unwind through `end`/`rollback` without
/// issuing anything further, and the next outermost `start` begins afresh.

use tracing::{debug, warn};

use crate::storage::{Database, StorageError};

/// A statement that changes the physical transaction on the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalOp {
    Begin,
    Commit,
    Rollback,
}

impl PhysicalOp {
    pub fn sql(&self) -> &'static str {
        match self {
            PhysicalOp::Begin => "BEGIN TRANSACTION",
            PhysicalOp::Commit => "COMMIT",
            PhysicalOp::Rollback => "ROLLBACK",
        }
    }
}

/// Depth counter for logical transaction scopes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionState {
    depth: u32,
    /// The physical transaction was rolled back while scopes were still open
    aborted: bool,
}

impl TransactionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Open a scope; only the outermost one begins a physical transaction
    pub fn start(&mut self) -> Option<PhysicalOp> {
        let outermost = self.depth == 0;
        self.depth += 1;

        if outermost {
            self.aborted = false;
            Some(PhysicalOp::Begin)
        } else {
            if self.aborted {
                warn!(
                    depth = self.depth,
                    "Transaction scope opened after the physical transaction was rolled back"
                );
            }
            None
        }
    }

    /// Close a scope; the last one commits unless the transaction was aborted
    pub fn end(&mut self) -> Option<PhysicalOp> {
        if self.depth == 0 {
            warn!("Transaction end without a matching start, ignoring");
            return None;
        }

        self.depth -= 1;
        if self.depth > 0 {
            return None;
        }

        if std::mem::take(&mut self.aborted) {
            debug!("Outermost scope closed after rollback, skipping commit");
            None
        } else {
            Some(PhysicalOp::Commit)
        }
    }

    /// Abort the physical transaction and close one scope
    pub fn rollback(&mut self) -> Option<PhysicalOp> {
        if self.depth == 0 {
            warn!("Transaction rollback without an open scope, ignoring");
            return None;
        }

        self.depth -= 1;
        let already_aborted = self.aborted;
        self.aborted = self.depth > 0;

        if already_aborted {
            None
        } else {
            Some(PhysicalOp::Rollback)
        }
    }

    /// Forget every open scope, returning how many there were
    pub(crate) fn reset(&mut self) -> u32 {
        self.aborted = false;
        std::mem::take(&mut self.depth)
    }
}

impl Database {
    /// Open a transaction scope, beginning a physical transaction if it is the outermost one
    pub async fn transaction_start(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        self.open_if_needed(&mut state)?;

        let state = &mut *state;
        let (Some(conn), Some(op)) = (state.conn.as_ref(), state.tx.start()) else {
            return Ok(());
        };

        debug!("{}", op.sql());
        if let Err(e) = conn.execute_batch(op.sql()) {
            // BEGIN never happened, so the scope does not exist either
            state.tx.reset();
            return Err(StorageError::Query(e));
        }
        Ok(())
    }

    /// Close a transaction scope, committing if it was the outermost one
    ///
    /// A failed COMMIT is rolled back before the error is returned, so the
    /// connection is never left inside a dangling transaction.
    pub async fn transaction_end(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }

        let state = &mut *state;
        let (Some(conn), Some(op)) = (state.conn.as_ref(), state.tx.end()) else {
            return Ok(());
        };

        debug!("{}", op.sql());
        if let Err(e) = conn.execute_batch(op.sql()) {
            warn!("Commit failed, rolling back: {}", e);
            if !conn.is_autocommit() {
                if let Err(rollback_err) = conn.execute_batch(PhysicalOp::Rollback.sql()) {
                    warn!("Rollback after failed commit also failed: {}", rollback_err);
                }
            }
            return Err(StorageError::Query(e));
        }
        Ok(())
    }

    /// Roll back the physical transaction immediately, whatever the nesting depth
    pub async fn transaction_rollback(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }

        let state = &mut *state;
        let (Some(conn), Some(op)) = (state.conn.as_ref(), state.tx.rollback()) else {
            return Ok(());
        };

        debug!(remaining_depth = state.tx.depth(), "{}", op.sql());
        conn.execute_batch(op.sql())?;
        Ok(())
    }

    /// Number of transaction scopes currently open
    pub async fn transaction_depth(&self) -> u32 {
        self.state.lock().await.tx.depth()
    }

    /// Whether the connection is inside a physical transaction
    pub async fn in_transaction(&self) -> bool {
        let state = self.state.lock().await;
        state
            .conn
            .as_ref()
            .map(|conn| !conn.is_autocommit())
            .unwrap_or(false)
    }
}
