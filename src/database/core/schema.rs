//! Schema descriptors
//!
//! A [`TableSchema`] declares one managed table: its name, the base columns
//! that are reserved for its lifetime, the per-dialect column definitions, and
//! the row inserted when the table is first created.

use crate::database::core::dialect::{BackendKind, Dialect};
use crate::database::core::value::SqlValue;
use crate::error::{KathamoError, Result};
use serde::{Deserialize, Serialize};

/// Type tokens accepted by `add_column`, matched as prefixes of the
/// uppercased request (`VARCHAR(64)` matches `VARCHAR`).
pub const ALLOWED_TYPE_PREFIXES: &[&str] = &[
    "TEXT", "VARCHAR", "CHAR", "INTEGER", "INT", "BIGINT", "SMALLINT", "REAL", "FLOAT", "DOUBLE",
    "DECIMAL", "NUMERIC", "BOOLEAN", "DATE", "DATETIME", "TIMESTAMP",
];

/// MySQL caps identifiers at 64 characters; SQLite follows the same limit here.
const MAX_IDENTIFIER_LEN: usize = 64;

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
}

/// A row inserted right after a table is created
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRow {
    pub columns: Vec<String>,
    pub values: Vec<SqlValue>,
}

impl SeedRow {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    pub fn insert_sql(&self, dialect: &Dialect, table: &str) -> String {
        dialect.insert_sql(table, &self.columns)
    }
}

impl Default for SeedRow {
    fn default() -> Self {
        Self::new()
    }
}

/// Declaration of one managed table
pub trait TableSchema: Send + Sync {
    fn table_name(&self) -> &str;

    /// Canonical ordered list of reserved columns
    fn base_columns(&self) -> &[&'static str];

    /// Column definitions (inside the parentheses of CREATE TABLE) for a dialect
    fn base_columns_ddl(&self, kind: BackendKind) -> &'static str;

    /// Row inserted by bootstrap; `None` leaves the new table empty
    fn default_seed_row(&self) -> Option<SeedRow>;

    fn create_table_sql(&self, kind: BackendKind) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            kind.dialect().quote_ident(self.table_name()),
            self.base_columns_ddl(kind)
        )
    }

    fn is_base_column(&self, name: &str) -> bool {
        self.base_columns()
            .iter()
            .any(|base| base.eq_ignore_ascii_case(name))
    }
}

/// Reject names that are not plain identifiers
pub fn validate_column_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(KathamoError::InvalidColumnName(name.to_string()))
    }
}

/// Normalize a requested column type, rejecting unknown type tokens
pub fn normalize_column_type(sql_type: &str) -> Result<String> {
    let normalized = sql_type.trim().to_uppercase();
    if ALLOWED_TYPE_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        Ok(normalized)
    } else {
        Err(KathamoError::InvalidType(sql_type.to_string()))
    }
}

/// Top-level definitions of a CREATE TABLE body
///
/// Commas inside parentheses (`DECIMAL(10,2)`, `PRIMARY KEY (a, b)`) do not split.
#[cfg(test)]
pub(crate) fn split_definitions(ddl: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in ddl.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&ddl[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&ddl[start..]);
    parts
}

/// Column names declared in a CREATE TABLE body, in order
///
/// Table-level constraints (`PRIMARY KEY (...)`, `UNIQUE (...)`, ...) are skipped.
#[cfg(test)]
pub(crate) fn ddl_column_names(ddl: &str) -> Vec<String> {
    const CONSTRAINT_KEYWORDS: &[&str] = &[
        "PRIMARY",
        "UNIQUE",
        "CONSTRAINT",
        "FOREIGN",
        "CHECK",
        "KEY",
        "INDEX",
    ];

    split_definitions(ddl)
        .into_iter()
        .filter_map(|def| def.split_whitespace().next())
        .map(|token| token.trim_matches(|c| c == '"' || c == '`'))
        .filter(|token| {
            !token.is_empty()
                && !CONSTRAINT_KEYWORDS
                    .iter()
                    .any(|kw| kw.eq_ignore_ascii_case(token))
        })
        .map(str::to_string)
        .collect()
}
