#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Kathamo - schema management over SQLite or MySQL
//!
//! Kathamo opens a single relational backend chosen from configuration,
//! creates and seeds the tables it manages on first start, and lets an
//! administrator add or remove custom columns on a live table. Base columns
//! declared by a table's schema are never altered.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Library: connections, schema evolution, bootstrap | `rusqlite`, `sqlx`, `tokio` |
//! | `display` | Table rendering of command results | `tabled` |
//! | `cli` | The `kathamo` admin binary | All above + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! kathamo = { version = "0.1", default-features = false }
//!
//! # Default (CLI binary)
//! kathamo = "0.1"
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: All database functionality
//!   - `core`: connections, dialects, schema descriptors, evolution, bootstrap
//!   - `users`: the managed `users` table and its repository
//! - **[`config`]**: Configuration from file, `.env` and `KATHAMO_*` variables
//! - **[`error`]**: The crate-wide error type
//! - **[`output`]**: Table and JSON rendering
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use kathamo::{bootstrap, Database, KathamoConfig, SchemaEvolver, UserSchema};
//!
//! let config = KathamoConfig::new(&None)?;
//! let db = Database::connect(&config.database_config()).await?;
//!
//! let users = UserSchema::default();
//! let existed = bootstrap(&db, &[&users]).await?;
//! if !existed[0] {
//!     println!("created users table");
//! }
//!
//! let evolver = SchemaEvolver::new(&db, &users);
//! evolver.add_column("nickname", "VARCHAR(64)").await?;
//! evolver.delete_column("nickname").await?;
//!
//! db.close().await?;
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod output;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{DatabaseConfig, KathamoConfig, MySqlSettings};

// =============================================================================
// Errors
// =============================================================================

pub use error::{BootstrapStage, KathamoError, Result};

// =============================================================================
// Database
// =============================================================================

pub use database::{
    bootstrap, BackendKind, ColumnDef, Database, Dialect, Row, SchemaEvolver, SqlValue,
    TableSchema,
};

pub use database::{
    NewUser, NoSeed, PlaceholderAdmin, SeedUser, UserRecord, UserRepository, UserSchema,
    UserSeed,
};

pub use output::OutputFormat;
