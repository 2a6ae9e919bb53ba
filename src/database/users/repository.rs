//! User repository
//!
//! Data access for the `users` table. Rows come back as a typed base record
//! plus an ordered map of whatever custom columns the table has right now.

use crate::database::core::{row_text, Database, Row, SqlValue};
use crate::database::users::schema::{new_user_id, USERS_TABLE, USER_BASE_COLUMNS};
use crate::error::{KathamoError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// A `users` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub status: String,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Custom columns in table order; values are text or null
    pub custom: Map<String, Value>,
}

impl UserRecord {
    fn from_row(mut row: Row) -> Result<Self> {
        let required = |row: &Row, column: &str| {
            row_text(row, column).ok_or_else(|| {
                KathamoError::Query(format!("users row is missing '{}'", column))
            })
        };

        let record = UserRecord {
            id: required(&row, "id")?,
            username: required(&row, "username")?,
            email: required(&row, "email")?,
            password_hash: required(&row, "password_hash")?,
            display_name: row_text(&row, "display_name"),
            status: required(&row, "status")?,
            auth_token: row_text(&row, "auth_token"),
            created_at: required(&row, "created_at")?,
            updated_at: required(&row, "updated_at")?,
            custom: Map::new(),
        };

        row.retain(|column, _| !USER_BASE_COLUMNS.contains(&column.as_str()));
        Ok(UserRecord {
            custom: row,
            ..record
        })
    }

    /// Value of a custom column, if set
    pub fn custom_value(&self, column: &str) -> Option<&str> {
        self.custom.get(column).and_then(Value::as_str)
    }
}

/// Fields for a new `users` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

impl NewUser {
    pub fn new(username: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "!".to_string(),
            display_name: None,
        }
    }
}

/// Repository for `users` operations
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn table(&self) -> String {
        self.db.dialect().quote_ident(USERS_TABLE)
    }

    /// Insert a user, returning its generated id
    pub async fn insert(&self, user: &NewUser) -> Result<String> {
        let id = new_user_id();
        let sql = format!(
            "INSERT INTO {} (id, username, email, password_hash, display_name) VALUES (?, ?, ?, ?, ?)",
            self.table()
        );
        self.db
            .execute(
                &sql,
                &[
                    SqlValue::from(&id),
                    SqlValue::from(&user.username),
                    SqlValue::from(&user.email),
                    SqlValue::from(&user.password_hash),
                    SqlValue::from(user.display_name.clone()),
                ],
            )
            .await?;
        info!(id = %id, username = %user.username, "inserted user");
        Ok(id)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        self.find_one("id", id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.find_one("email", email).await
    }

    /// All users, oldest first
    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        let sql = format!("SELECT * FROM {} ORDER BY created_at, username", self.table());
        self.db
            .query_rows(&sql, &[])
            .await?
            .into_iter()
            .map(UserRecord::from_row)
            .collect()
    }

    pub async fn count(&self) -> Result<u64> {
        #[derive(serde::Deserialize)]
        struct Count {
            count: u64,
        }

        let sql = format!("SELECT COUNT(*) AS count FROM {}", self.table());
        let rows: Vec<Count> = self.db.query(&sql, &[]).await?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    /// Set a custom column on one user
    ///
    /// Returns `false` when no user has that id.
    pub async fn set_custom_value(
        &self,
        id: &str,
        column: &str,
        value: Option<&str>,
    ) -> Result<bool> {
        if USER_BASE_COLUMNS
            .iter()
            .any(|base| base.eq_ignore_ascii_case(column))
        {
            return Err(KathamoError::ProtectedColumn(column.to_string()));
        }
        let existing = self
            .db
            .table_columns(USERS_TABLE)
            .await?
            .into_iter()
            .find(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| KathamoError::ColumnNotFound {
                table: USERS_TABLE.to_string(),
                column: column.to_string(),
            })?;

        let dialect = self.db.dialect();
        let sql = format!(
            "UPDATE {} SET {} = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            self.table(),
            dialect.quote_ident(&existing)
        );
        let changed = self
            .db
            .execute(&sql, &[SqlValue::from(value), SqlValue::from(id)])
            .await?;
        Ok(changed > 0)
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT * FROM {} WHERE {} = ?", self.table(), column);
        let mut rows = self.db.query_rows(&sql, &[SqlValue::from(value)]).await?;
        match rows.pop() {
            Some(row) => Ok(Some(UserRecord::from_row(row)?)),
            None => Ok(None),
        }
    }
}
