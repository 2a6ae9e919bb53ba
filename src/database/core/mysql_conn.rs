//! MySQL connection pool management
//!
//! This module provides the client/server connection wrapper used by [`Database`].
//! Every statement borrows one pooled connection for its own duration; the
//! connection goes back to the pool when the guard drops, on success and on error.
//!
//! [`Database`]: super::Database

use crate::config::MySqlSettings;
use crate::database::core::value::{Row, SqlValue};
use crate::error::{KathamoError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row as _};
use tracing::{debug, info};

/// Pooled MySQL connection wrapper
#[derive(Clone)]
pub struct MySqlConn {
    pool: MySqlPool,
}

impl MySqlConn {
    /// Create the pool and verify that a connection can be established
    pub async fn connect(settings: &MySqlSettings) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                KathamoError::Connection(format!(
                    "Failed to connect to MySQL at {}:{}: {}",
                    settings.host, settings.port, e
                ))
            })?;

        info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "opened MySQL pool"
        );
        Ok(Self { pool })
    }

    /// Run a statement and collect every returned row
    pub async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        debug!(sql, "mysql query");
        let mut conn = self.pool.acquire().await?;
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    /// Execute a statement, returning the affected row count
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!(sql, "mysql execute");
        let mut conn = self.pool.acquire().await?;
        let done = bind_all(sqlx::query(sql), params)
            .execute(&mut *conn)
            .await?;
        Ok(done.rows_affected())
    }

    /// Close the pool, waiting for borrowed connections to come back
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Real(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

fn decode_row(row: &MySqlRow) -> Row {
    let mut record = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        record.insert(column.name().to_string(), decode_cell(row, idx));
    }
    record
}

/// Decode one cell by trying the Rust types MySQL columns map onto
///
/// `try_get` refuses incompatible column types without panicking, so the
/// first compatible type wins. NULL decodes as `None` for any type.
fn decode_cell(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    // TIMESTAMP columns only decode as DateTime<Utc>
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v
            .map(|t| Value::String(t.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v
            .map(|t| Value::String(t.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v
            .map(|t| Value::String(t.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|b| Value::String(String::from_utf8_lossy(&b).into_owned()))
            .unwrap_or(Value::Null);
    }
    // DECIMAL and friends travel as text on the wire
    row.try_get_unchecked::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .map(Value::String)
        .unwrap_or(Value::Null)
}
