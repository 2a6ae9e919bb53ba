//! Runtime column evolution
//!
//! [`SchemaEvolver`] adds and removes custom columns on a live table. Base
//! columns declared by the [`TableSchema`] can never be touched.
//!
//! Structural changes are not safe to interleave: callers must make sure only
//! one evolver call runs at a time and that no other query hits the table
//! while a SQLite rebuild is in flight.

use crate::database::core::connection::Database;
use crate::database::core::rebuild::TableRebuild;
use crate::database::core::schema::{
    normalize_column_type, validate_column_name, ColumnDef, TableSchema,
};
use crate::error::{KathamoError, Result};
use tracing::info;

pub struct SchemaEvolver<'a> {
    db: &'a Database,
    schema: &'a dyn TableSchema,
}

impl<'a> SchemaEvolver<'a> {
    pub fn new(db: &'a Database, schema: &'a dyn TableSchema) -> Self {
        Self { db, schema }
    }

    /// Current column names, in table order
    pub async fn columns(&self) -> Result<Vec<String>> {
        self.db.table_columns(self.schema.table_name()).await
    }

    /// Current columns with their declared types
    pub async fn column_defs(&self) -> Result<Vec<ColumnDef>> {
        self.db.table_column_defs(self.schema.table_name()).await
    }

    /// Current columns that are not base columns
    pub async fn custom_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .columns()
            .await?
            .into_iter()
            .filter(|c| !self.schema.is_base_column(c))
            .collect())
    }

    /// Add a nullable custom column
    ///
    /// `sql_type` is validated against the allowed type tokens, but the column
    /// is always stored with the dialect's generic text type.
    pub async fn add_column(&self, name: &str, sql_type: &str) -> Result<()> {
        self.ensure_custom(name)?;
        let requested = normalize_column_type(sql_type)?;

        let dialect = self.db.dialect();
        let sql = dialect.add_column_sql(self.schema.table_name(), name);
        self.db.execute(&sql, &[]).await?;

        info!(
            table = self.schema.table_name(),
            column = name,
            requested_type = %requested,
            stored_type = dialect.custom_column_type,
            "added column"
        );
        Ok(())
    }

    /// Remove a custom column
    ///
    /// Uses native `DROP COLUMN` where the dialect has it, and a transactional
    /// table rebuild on SQLite. Names match existing columns in any case.
    pub async fn delete_column(&self, name: &str) -> Result<()> {
        self.ensure_custom(name)?;
        let table = self.schema.table_name();
        let dialect = self.db.dialect();

        if !dialect.native_drop_column {
            let mut rebuild = TableRebuild::new(self.schema, name);
            return self.db.with_sqlite(|conn| rebuild.run(conn));
        }

        let existing = self.existing_column(name).await?;
        self.db
            .execute(&dialect.drop_column_sql(table, &existing), &[])
            .await?;
        info!(table, column = %existing, "dropped column");
        Ok(())
    }

    /// Catalog spelling of `name`
    async fn existing_column(&self, name: &str) -> Result<String> {
        self.columns()
            .await?
            .into_iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| KathamoError::ColumnNotFound {
                table: self.schema.table_name().to_string(),
                column: name.to_string(),
            })
    }

    fn ensure_custom(&self, name: &str) -> Result<()> {
        if self.schema.is_base_column(name) {
            return Err(KathamoError::ProtectedColumn(name.to_string()));
        }
        validate_column_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{bootstrap, SqlValue};
    use crate::database::users::{NoSeed, UserSchema, USER_BASE_COLUMNS};

    async fn setup() -> (Database, UserSchema) {
        let db = Database::open_in_memory().await.unwrap();
        let schema = UserSchema::new(NoSeed);
        bootstrap(&db, &[&schema]).await.unwrap();
        (db, schema)
    }

    #[tokio::test]
    async fn test_add_then_delete_column() {
        let (db, schema) = setup().await;
        let evolver = SchemaEvolver::new(&db, &schema);

        evolver.add_column("nickname", "varchar(32)").await.unwrap();
        assert_eq!(evolver.custom_columns().await.unwrap(), vec!["nickname"]);

        let defs = evolver.column_defs().await.unwrap();
        let nickname = defs.iter().find(|d| d.name == "nickname").unwrap();
        assert_eq!(nickname.sql_type, "TEXT");

        db.execute(
            "INSERT INTO users (id, username, email, password_hash, nickname) VALUES (?, ?, ?, ?, ?)",
            &[
                SqlValue::from("u1"),
                SqlValue::from("alice"),
                SqlValue::from("alice@example.com"),
                SqlValue::from("!"),
                SqlValue::from("ally"),
            ],
        )
        .await
        .unwrap();

        evolver.delete_column("nickname").await.unwrap();
        assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);

        let rows = db
            .query_rows("SELECT username FROM users WHERE id = 'u1'", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "alice");
    }

    #[tokio::test]
    async fn test_base_columns_are_protected() {
        let (db, schema) = setup().await;
        let evolver = SchemaEvolver::new(&db, &schema);

        for column in USER_BASE_COLUMNS {
            assert!(matches!(
                evolver.add_column(column, "TEXT").await,
                Err(KathamoError::ProtectedColumn(_))
            ));
            assert!(matches!(
                evolver.delete_column(column).await,
                Err(KathamoError::ProtectedColumn(_))
            ));
            assert!(matches!(
                evolver.delete_column(&column.to_uppercase()).await,
                Err(KathamoError::ProtectedColumn(_))
            ));
        }
        assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);
    }

    #[tokio::test]
    async fn test_rejected_inputs_leave_table_alone() {
        let (db, schema) = setup().await;
        let evolver = SchemaEvolver::new(&db, &schema);

        assert!(matches!(
            evolver.add_column("nickname", "FUNKYTYPE").await,
            Err(KathamoError::InvalidType(_))
        ));
        assert!(matches!(
            evolver.add_column("nick name", "TEXT").await,
            Err(KathamoError::InvalidColumnName(_))
        ));
        assert!(matches!(
            evolver.delete_column("shoe_size").await,
            Err(KathamoError::ColumnNotFound { .. })
        ));
        assert!(evolver.custom_columns().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_matches_column_in_any_case() {
        let (db, schema) = setup().await;
        let evolver = SchemaEvolver::new(&db, &schema);

        evolver.add_column("NickName", "TEXT").await.unwrap();
        assert!(matches!(
            evolver.add_column("nickname", "TEXT").await,
            Err(KathamoError::Query(_))
        ));

        evolver.delete_column("nickname").await.unwrap();
        assert!(evolver.custom_columns().await.unwrap().is_empty());
        assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);
    }

    #[tokio::test]
    async fn test_add_existing_column_fails() {
        let (db, schema) = setup().await;
        let evolver = SchemaEvolver::new(&db, &schema);

        evolver.add_column("nickname", "TEXT").await.unwrap();
        assert!(matches!(
            evolver.add_column("nickname", "TEXT").await,
            Err(KathamoError::Query(_))
        ));
    }
}
