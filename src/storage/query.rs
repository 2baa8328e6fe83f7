/// Typed query execution
///
/// Parameterized statements run against the managed connection, which is
/// opened on demand. Results come back as [`Record`]s, single values or
/// columns, or decoded straight into `serde` types. After the database is
/// closed every call returns an empty or zero result.
///
/// Failures are logged and returned as-is; rolling back is the job of
/// whoever owns the enclosing transaction.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::storage::{Database, Record, StorageError};

/// Outcome of a mutating statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Rows inserted, updated or deleted
    pub changes: usize,
    pub last_insert_id: i64,
}

impl Database {
    /// Run a mutating statement
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult, StorageError> {
        let mut state = self.state.lock().await;
        let Some(conn) = self.ready(&mut state)? else {
            return Ok(ExecuteResult::default());
        };

        debug!(sql = sql.trim(), "execute");
        let changes = conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| statement_error(sql, e))?;

        Ok(ExecuteResult {
            changes,
            last_insert_id: conn.last_insert_rowid(),
        })
    }

    /// All result rows, mapped by column name
    pub async fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, StorageError> {
        let mut state = self.state.lock().await;
        let Some(conn) = self.ready(&mut state)? else {
            return Ok(Vec::new());
        };

        debug!(sql = sql.trim(), "query");
        collect_records(conn, sql, params, None).map_err(|e| statement_error(sql, e))
    }

    /// The first result row, if any
    pub async fn query_row(&self, sql: &str, params: &[Value]) -> Result<Option<Record>, StorageError> {
        let mut state = self.state.lock().await;
        let Some(conn) = self.ready(&mut state)? else {
            return Ok(None);
        };

        debug!(sql = sql.trim(), "query row");
        let records = collect_records(conn, sql, params, Some(1)).map_err(|e| statement_error(sql, e))?;
        Ok(records.into_iter().next())
    }

    /// First column of the first row
    pub async fn query_scalar(&self, sql: &str, params: &[Value]) -> Result<Option<Value>, StorageError> {
        let mut state = self.state.lock().await;
        let Some(conn) = self.ready(&mut state)? else {
            return Ok(None);
        };

        debug!(sql = sql.trim(), "query scalar");
        let values = collect_first_column(conn, sql, params, Some(1)).map_err(|e| statement_error(sql, e))?;
        Ok(values.into_iter().next())
    }

    /// First column across all rows
    pub async fn query_column(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, StorageError> {
        let mut state = self.state.lock().await;
        let Some(conn) = self.ready(&mut state)? else {
            return Ok(Vec::new());
        };

        debug!(sql = sql.trim(), "query column");
        collect_first_column(conn, sql, params, None).map_err(|e| statement_error(sql, e))
    }

    /// All result rows decoded into `T`
    pub async fn query_as<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>, StorageError> {
        let records = self.query_rows(sql, params).await?;
        records
            .iter()
            .map(|record| record.decode::<T>().map_err(StorageError::from))
            .collect()
    }

    /// The first result row decoded into `T`, if any
    pub async fn query_one_as<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<Option<T>, StorageError> {
        match self.query_row(sql, params).await? {
            Some(record) => Ok(Some(record.decode()?)),
            None => Ok(None),
        }
    }
}

fn statement_error(sql: &str, e: rusqlite::Error) -> StorageError {
    error!(sql = sql.trim(), "SQL error: {}", e);
    StorageError::Query(e)
}

fn collect_records(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    limit: Option<usize>,
) -> rusqlite::Result<Vec<Record>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(columns.len());
        for (index, name) in columns.iter().enumerate() {
            record.insert(name.as_str(), row.get::<_, Value>(index)?);
        }
        records.push(record);

        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
    }
    Ok(records)
}

fn collect_first_column(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    limit: Option<usize>,
) -> rusqlite::Result<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;

    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(row.get::<_, Value>(0)?);

        if limit.is_some_and(|limit| values.len() >= limit) {
            break;
        }
    }
    Ok(values)
}
