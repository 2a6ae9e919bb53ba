//! Error types for kathamo
//!
//! Every fallible operation in the library returns [`KathamoError`]. Nothing is
//! retried or swallowed internally; the immediate caller decides what to do.

use std::fmt;
use thiserror::Error;

/// Result type for kathamo operations.
pub type Result<T> = std::result::Result<T, KathamoError>;

/// Stage of table bootstrap that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    /// Running the CREATE TABLE statement
    Create,
    /// Inserting the seed row
    Seed,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStage::Create => write!(f, "create"),
            BootstrapStage::Seed => write!(f, "seed"),
        }
    }
}

/// Errors that can occur while talking to the store or evolving its schema.
#[derive(Debug, Error)]
pub enum KathamoError {
    /// The connection was never opened or has already been closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Attempt to add or delete a base column.
    #[error("column '{0}' is a base column and cannot be added or removed")]
    ProtectedColumn(String),

    /// Requested column type does not start with a recognised type token.
    #[error("invalid column type '{0}'")]
    InvalidType(String),

    /// Column name is not a plain SQL identifier.
    #[error("invalid column name '{0}'")]
    InvalidColumnName(String),

    /// Column to delete (or write) does not exist in the table.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Underlying driver or engine failure, with the original message.
    #[error("query error: {0}")]
    Query(String),

    /// CREATE or seed failure while bootstrapping a table.
    #[error("failed to bootstrap table '{table}' ({stage}): {source}")]
    SchemaBootstrap {
        table: String,
        stage: BootstrapStage,
        #[source]
        source: Box<KathamoError>,
    },

    /// A row could not be converted into the caller's row shape.
    #[error("row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for KathamoError {
    fn from(err: rusqlite::Error) -> Self {
        KathamoError::Query(err.to_string())
    }
}

impl From<sqlx::Error> for KathamoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => KathamoError::Connection("connection pool is closed".into()),
            other => KathamoError::Query(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for KathamoError {
    fn from(err: config::ConfigError) -> Self {
        KathamoError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_error_message() {
        let err = KathamoError::SchemaBootstrap {
            table: "users".to_string(),
            stage: BootstrapStage::Seed,
            source: Box::new(KathamoError::Query("UNIQUE constraint failed".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "failed to bootstrap table 'users' (seed): query error: UNIQUE constraint failed"
        );
    }

    #[test]
    fn test_pool_closed_maps_to_connection_error() {
        let err: KathamoError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, KathamoError::Connection(_)));
    }
}
