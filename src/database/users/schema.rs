//! Schema descriptor for the `users` table

use crate::database::core::{BackendKind, SeedRow, TableSchema};
use uuid::Uuid;

pub const USERS_TABLE: &str = "users";

/// Reserved columns of `users`, in table order
pub const USER_BASE_COLUMNS: &[&str] = &[
    "id",
    "username",
    "email",
    "password_hash",
    "display_name",
    "status",
    "auth_token",
    "created_at",
    "updated_at",
];

// Both blocks must list USER_BASE_COLUMNS in the same order with the same
// constraints; only type tokens differ.
const SQLITE_COLUMNS: &str = r#"
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    auth_token TEXT UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
"#;

const MYSQL_COLUMNS: &str = r#"
    id VARCHAR(36) PRIMARY KEY NOT NULL,
    username VARCHAR(255) NOT NULL UNIQUE,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    display_name VARCHAR(255),
    status VARCHAR(32) NOT NULL DEFAULT 'active',
    auth_token VARCHAR(255) UNIQUE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
"#;

/// Values for the row inserted when `users` is first created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Supplies the bootstrap row for `users`
pub trait UserSeed: Send + Sync {
    fn seed_user(&self) -> Option<SeedUser>;
}

/// Seeds an `admin` account whose password hash can never match (`!`)
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderAdmin;

impl UserSeed for PlaceholderAdmin {
    fn seed_user(&self) -> Option<SeedUser> {
        Some(SeedUser {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "!".to_string(),
            display_name: Some("Administrator".to_string()),
        })
    }
}

/// Leaves a freshly created `users` table empty
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSeed;

impl UserSeed for NoSeed {
    fn seed_user(&self) -> Option<SeedUser> {
        None
    }
}

impl UserSeed for SeedUser {
    fn seed_user(&self) -> Option<SeedUser> {
        Some(self.clone())
    }
}

/// The managed `users` table
pub struct UserSchema {
    seed: Box<dyn UserSeed>,
}

impl UserSchema {
    pub fn new(seed: impl UserSeed + 'static) -> Self {
        Self {
            seed: Box::new(seed),
        }
    }
}

impl Default for UserSchema {
    fn default() -> Self {
        Self::new(PlaceholderAdmin)
    }
}

impl TableSchema for UserSchema {
    fn table_name(&self) -> &str {
        USERS_TABLE
    }

    fn base_columns(&self) -> &[&'static str] {
        USER_BASE_COLUMNS
    }

    fn base_columns_ddl(&self, kind: BackendKind) -> &'static str {
        match kind {
            BackendKind::Sqlite => SQLITE_COLUMNS,
            BackendKind::MySql => MYSQL_COLUMNS,
        }
    }

    fn default_seed_row(&self) -> Option<SeedRow> {
        let user = self.seed.seed_user()?;
        Some(
            SeedRow::new()
                .with("id", new_user_id())
                .with("username", user.username)
                .with("email", user.email)
                .with("password_hash", user.password_hash)
                .with("display_name", user.display_name),
        )
    }
}

/// Fresh identity token for a `users` row
pub fn new_user_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{ddl_column_names, split_definitions, SqlValue};

    #[test]
    fn test_dialect_blocks_match_base_columns() {
        let schema = UserSchema::default();
        for kind in [BackendKind::Sqlite, BackendKind::MySql] {
            assert_eq!(
                ddl_column_names(schema.base_columns_ddl(kind)),
                USER_BASE_COLUMNS,
                "{} column block out of sync",
                kind
            );
        }
    }

    #[test]
    fn test_dialect_blocks_share_constraints() {
        let constraints = |ddl: &str| -> Vec<(bool, bool, bool)> {
            split_definitions(ddl)
                .into_iter()
                .map(|def| {
                    let def = def.to_uppercase();
                    (
                        def.contains("NOT NULL"),
                        def.contains("UNIQUE"),
                        def.contains("DEFAULT"),
                    )
                })
                .collect()
        };
        assert_eq!(
            constraints(SQLITE_COLUMNS),
            constraints(MYSQL_COLUMNS)
        );
    }

    #[test]
    fn test_create_table_sql() {
        let schema = UserSchema::default();
        let sql = schema.create_table_sql(BackendKind::MySql);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `users` ("));
        assert!(sql.contains("VARCHAR(36)"));
    }

    #[test]
    fn test_base_column_check_ignores_case() {
        let schema = UserSchema::default();
        assert!(schema.is_base_column("email"));
        assert!(schema.is_base_column("EMAIL"));
        assert!(!schema.is_base_column("nickname"));
    }

    #[test]
    fn test_seed_row_has_fresh_id() {
        let schema = UserSchema::default();
        let first = schema.default_seed_row().unwrap();
        let second = schema.default_seed_row().unwrap();

        assert_eq!(first.columns[0], "id");
        assert_ne!(first.values[0], second.values[0]);
        assert_eq!(first.values[1], SqlValue::from("admin"));
    }

    #[test]
    fn test_no_seed() {
        let schema = UserSchema::new(NoSeed);
        assert!(schema.default_seed_row().is_none());
    }
}
