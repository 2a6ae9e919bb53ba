//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `Database`: connection manager over SQLite or a MySQL pool
//! - `Dialect`: per-backend SQL fragments
//! - `TableSchema`: schema descriptor trait
//! - `SchemaEvolver`: runtime add/delete of custom columns
//! - `bootstrap`: create-and-seed of missing tables at startup

mod bootstrap;
mod connection;
mod dialect;
mod evolver;
mod mysql_conn;
mod rebuild;
mod schema;
mod sqlite_conn;
mod value;

pub use bootstrap::bootstrap;
pub use connection::Database;
pub use dialect::{BackendKind, Dialect};
pub use evolver::SchemaEvolver;
pub use rebuild::{RebuildStep, TableRebuild};
pub use schema::{
    normalize_column_type, validate_column_name, ColumnDef, SeedRow, TableSchema,
    ALLOWED_TYPE_PREFIXES,
};
pub use value::{Row, SqlValue};

pub(crate) use value::row_text;

#[cfg(test)]
pub(crate) use schema::{ddl_column_names, split_definitions};
