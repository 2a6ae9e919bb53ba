//! Backend kinds and their SQL dialects
//!
//! Everything that differs between the embedded engine (SQLite) and the
//! client/server engine (MySQL) lives in one [`Dialect`] table, picked once
//! when the connection is opened. Call sites ask the dialect instead of
//! branching on the backend kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which relational engine a deployment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded file-based engine (SQLite)
    Sqlite,
    /// Client/server engine (MySQL)
    MySql,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::MySql => "mysql",
        }
    }

    /// The dialect table for this backend
    pub fn dialect(&self) -> &'static Dialect {
        match self {
            BackendKind::Sqlite => &SQLITE_DIALECT,
            BackendKind::MySql => &MYSQL_DIALECT,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" | "embedded" => Ok(BackendKind::Sqlite),
            "mysql" | "mariadb" => Ok(BackendKind::MySql),
            other => Err(format!(
                "Unknown database type '{}'. Valid types: sqlite, mysql",
                other
            )),
        }
    }
}

/// Per-backend SQL fragments
#[derive(Debug)]
pub struct Dialect {
    pub kind: BackendKind,
    /// Returns one row (`name`) when the table bound to `?` exists
    pub table_exists_sql: &'static str,
    /// Returns the table's columns (`name`, `sql_type`) in declaration order
    pub columns_sql: &'static str,
    /// Keyword(s) following `ALTER TABLE t` to add a column
    pub add_column: &'static str,
    /// Whether `ALTER TABLE t DROP COLUMN c` is available
    pub native_drop_column: bool,
    /// Storage type for every custom column
    pub custom_column_type: &'static str,
    quote: char,
}

static SQLITE_DIALECT: Dialect = Dialect {
    kind: BackendKind::Sqlite,
    table_exists_sql: "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
    columns_sql: "SELECT name, type AS sql_type FROM pragma_table_info(?) ORDER BY cid",
    add_column: "ADD COLUMN",
    native_drop_column: false,
    custom_column_type: "TEXT",
    quote: '"',
};

static MYSQL_DIALECT: Dialect = Dialect {
    kind: BackendKind::MySql,
    table_exists_sql: "SELECT table_name AS name FROM information_schema.tables \
                       WHERE table_schema = DATABASE() AND table_name = ?",
    columns_sql: "SELECT column_name AS name, column_type AS sql_type FROM information_schema.columns \
                  WHERE table_schema = DATABASE() AND table_name = ? ORDER BY ordinal_position",
    add_column: "ADD",
    native_drop_column: true,
    custom_column_type: "TEXT",
    quote: '`',
};

impl Dialect {
    /// Quote an identifier for this dialect
    ///
    /// Callers validate identifiers before they get here; quoting only guards
    /// against reserved words.
    pub fn quote_ident(&self, ident: &str) -> String {
        let q = self.quote;
        let escaped = ident.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// `ALTER TABLE ... ADD [COLUMN] ... TEXT`
    pub fn add_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} {} {} {}",
            self.quote_ident(table),
            self.add_column,
            self.quote_ident(column),
            self.custom_column_type
        )
    }

    /// `ALTER TABLE ... DROP COLUMN ...`
    ///
    /// Only valid where `native_drop_column` is set.
    pub fn drop_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_ident(table),
            self.quote_ident(column)
        )
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?)`
    pub fn insert_sql(&self, table: &str, columns: &[String]) -> String {
        let cols = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(table),
            cols,
            placeholders
        )
    }
}
