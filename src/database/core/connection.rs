//! Database connection management
//!
//! [`Database`] is the single query entry point for the rest of the crate. It
//! owns exactly one live connection (SQLite) or one pool (MySQL), chosen by
//! [`DatabaseConfig`] when it is opened. The composition root creates it once
//! and hands `&Database` to everything else.

use crate::config::DatabaseConfig;
use crate::database::core::dialect::{BackendKind, Dialect};
use crate::database::core::mysql_conn::MySqlConn;
use crate::database::core::schema::ColumnDef;
use crate::database::core::sqlite_conn::SqliteConn;
use crate::database::core::value::{row_text, Row, SqlValue};
use crate::error::{KathamoError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

enum Handle {
    Sqlite(Arc<Mutex<SqliteConn>>),
    MySql(MySqlConn),
}

/// Connection manager over one of the two supported backends
pub struct Database {
    kind: BackendKind,
    handle: Mutex<Option<Handle>>,
}

impl Database {
    /// Open the backend described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let handle = match config {
            DatabaseConfig::Sqlite { path } => {
                let conn = SqliteConn::open(path.as_deref())?;
                info!(path = path.as_deref().unwrap_or(":memory:"), "opened SQLite database");
                Handle::Sqlite(Arc::new(Mutex::new(conn)))
            }
            DatabaseConfig::MySql(settings) => Handle::MySql(MySqlConn::connect(settings).await?),
        };

        Ok(Self {
            kind: config.backend_kind(),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Open an in-memory SQLite database
    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::Sqlite { path: None }).await
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.kind.dialect()
    }

    pub fn is_closed(&self) -> bool {
        match self.handle.lock() {
            Ok(guard) => match guard.as_ref() {
                None => true,
                Some(Handle::Sqlite(_)) => false,
                Some(Handle::MySql(pool)) => pool.is_closed(),
            },
            Err(_) => true,
        }
    }

    /// Run `sql` and deserialize every returned row into `T`
    pub async fn query<T: DeserializeOwned>(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<T>> {
        self.query_rows(sql, params)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(KathamoError::from))
            .collect()
    }

    /// Run `sql` and return the raw rows
    pub async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        match self.handle()? {
            Handle::Sqlite(conn) => sqlite_query_rows(&conn, sql, params),
            Handle::MySql(pool) => pool.query_rows(sql, params).await,
        }
    }

    /// Execute a statement, returning the number of affected rows
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        match self.handle()? {
            Handle::Sqlite(conn) => sqlite_execute(&conn, sql, params),
            Handle::MySql(pool) => pool.execute(sql, params).await,
        }
    }

    /// Check whether a table exists, using the backend's catalog
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let rows = self
            .query_rows(self.dialect().table_exists_sql, &[table.into()])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Column names of `table` in declaration order
    ///
    /// Returns an empty list when the table does not exist.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let rows = self
            .query_rows(self.dialect().columns_sql, &[table.into()])
            .await?;
        Ok(rows.iter().filter_map(|row| row_text(row, "name")).collect())
    }

    /// Column names and declared types of `table`
    pub async fn table_column_defs(&self, table: &str) -> Result<Vec<ColumnDef>> {
        self.query(self.dialect().columns_sql, &[table.into()]).await
    }

    /// Run `f` against the SQLite connection while holding its lock
    ///
    /// Used for multi-statement work that needs a real transaction. Fails with
    /// a connection error on any other backend.
    pub fn with_sqlite<R>(&self, f: impl FnOnce(&rusqlite::Connection) -> Result<R>) -> Result<R> {
        match self.handle()? {
            Handle::Sqlite(conn) => {
                let guard = lock_sqlite(&conn)?;
                f(&guard.conn)
            }
            Handle::MySql(_) => Err(KathamoError::Connection(
                "operation requires the SQLite backend".to_string(),
            )),
        }
    }

    /// Close the connection or pool
    ///
    /// Idempotent: once closed, further calls do nothing and queries fail
    /// with [`KathamoError::Connection`].
    pub async fn close(&self) -> Result<()> {
        let handle = self
            .handle
            .lock()
            .map_err(|_| KathamoError::Connection("connection lock poisoned".to_string()))?
            .take();

        match handle {
            None => {}
            Some(Handle::Sqlite(conn)) => {
                drop(conn);
                info!("closed SQLite database");
            }
            Some(Handle::MySql(pool)) => {
                pool.close().await;
                info!("closed MySQL pool");
            }
        }
        Ok(())
    }

    fn handle(&self) -> Result<Handle> {
        let guard = self
            .handle
            .lock()
            .map_err(|_| KathamoError::Connection("connection lock poisoned".to_string()))?;
        match guard.as_ref() {
            Some(Handle::Sqlite(conn)) => Ok(Handle::Sqlite(Arc::clone(conn))),
            Some(Handle::MySql(pool)) => Ok(Handle::MySql(pool.clone())),
            None => Err(KathamoError::Connection(
                "database connection not initialized or already closed".to_string(),
            )),
        }
    }
}

fn lock_sqlite(conn: &Mutex<SqliteConn>) -> Result<MutexGuard<'_, SqliteConn>> {
    conn.lock()
        .map_err(|_| KathamoError::Connection("SQLite connection lock poisoned".to_string()))
}

// The SQLite guard must not live across an await point, so these stay sync.
fn sqlite_query_rows(conn: &Mutex<SqliteConn>, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
    lock_sqlite(conn)?.query_rows(sql, params)
}

fn sqlite_execute(conn: &Mutex<SqliteConn>, sql: &str, params: &[SqlValue]) -> Result<u64> {
    lock_sqlite(conn)?.execute(sql, params)
}
