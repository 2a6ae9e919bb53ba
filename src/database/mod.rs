//! Database module
//!
//! This module provides all database functionality for kathamo, organized into:
//!
//! - **core**: Backend-neutral infrastructure (connections, dialects, schema
//!   descriptors, column evolution, bootstrap)
//! - **users**: The managed `users` table and its repository
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/            # Foundation
//! │   ├── connection   # Database handle over SQLite or a MySQL pool
//! │   ├── dialect      # Per-backend SQL fragments
//! │   ├── schema       # TableSchema descriptor trait
//! │   ├── evolver      # Add/delete custom columns at runtime
//! │   ├── rebuild      # SQLite table reconstruction for column removal
//! │   └── bootstrap    # Create-and-seed of missing tables
//! │
//! └── users/           # Managed entity
//!     ├── schema       # users table definition and seed providers
//!     └── repository   # Row access and custom values
//! ```
//!
//! # Database Backend Strategy
//!
//! One process talks to exactly one backend, chosen from configuration when
//! the [`Database`] is opened. SQLite is the default and needs no server;
//! MySQL is reached through a bounded connection pool. SQL that differs
//! between the two is kept in [`Dialect`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use kathamo::database::{bootstrap, Database, SchemaEvolver, UserRepository, UserSchema};
//!
//! let db = Database::connect(&config.database_config()).await?;
//! let users = UserSchema::default();
//!
//! // Create missing tables
//! let existed = bootstrap(&db, &[&users]).await?;
//!
//! // Grow the table at runtime
//! SchemaEvolver::new(&db, &users).add_column("nickname", "TEXT").await?;
//!
//! let repo = UserRepository::new(&db);
//! let admin = repo.find_by_email("admin@example.com").await?;
//! ```

pub mod core;
pub mod users;

// =============================================================================
// Core Types
// =============================================================================

pub use core::{
    bootstrap, BackendKind, ColumnDef, Database, Dialect, RebuildStep, Row, SchemaEvolver,
    SeedRow, SqlValue, TableRebuild, TableSchema,
};

// =============================================================================
// Users
// =============================================================================

pub use users::{
    NewUser, NoSeed, PlaceholderAdmin, SeedUser, UserRecord, UserRepository, UserSchema,
    UserSeed, USERS_TABLE, USER_BASE_COLUMNS,
};
