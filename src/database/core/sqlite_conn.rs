//! SQLite connection management
//!
//! This module provides the embedded-engine connection wrapper used by [`Database`].
//!
//! [`Database`]: super::Database

use crate::database::core::value::{sqlite_value_to_json, Row, SqlValue};
use crate::error::{KathamoError, Result};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

/// Core SQLite connection wrapper
///
/// `SqliteConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct SqliteConn {
    pub conn: Connection,
}

impl SqliteConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None` (or `:memory:`), an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) if p != ":memory:" => Connection::open(p).map_err(|e| {
                KathamoError::Connection(format!("Failed to open database at '{}': {}", p, e))
            })?,
            _ => Connection::open_in_memory().map_err(|e| {
                KathamoError::Connection(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = SqliteConn { conn };
        db.configure()?;
        Ok(db)
    }

    fn configure(&self) -> Result<()> {
        // WAL for file databases; in-memory databases silently stay on "memory"
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| KathamoError::Connection(format!("Failed to set journal mode: {}", e)))?;

        self.conn
            .execute_batch(
                "PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )
            .map_err(|e| KathamoError::Connection(format!("Failed to configure database: {}", e)))?;

        Ok(())
    }

    /// Run a statement and collect every returned row
    ///
    /// Statements that return no rows (DDL, INSERT, ...) yield an empty vector.
    pub fn query_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        debug!(sql, "sqlite query");
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                record.insert(name.clone(), sqlite_value_to_json(row.get_ref(idx)?));
            }
            result.push(record);
        }
        Ok(result)
    }

    /// Execute a SQL statement with parameters, returning the affected row count
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!(sql, "sqlite execute");
        let changed = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(changed as u64)
    }
}
