//! Column removal by table reconstruction
//!
//! SQLite builds without `DROP COLUMN` support (and tables whose constraints
//! rule it out) need the table rebuilt instead:
//!
//! ```text
//! ReadColumns -> BuildTemp -> CopyRows -> DropOriginal -> RenameTemp -> Done
//! ```
//!
//! Each step is one call to [`TableRebuild::advance`]. A failed step leaves the
//! state where it was, so the caller can inspect [`TableRebuild::step`] and
//! decide whether to retry or roll back. [`TableRebuild::run`] drives every
//! step inside a single transaction, so an interrupted rebuild never leaves the
//! table missing.

use crate::database::core::dialect::BackendKind;
use crate::database::core::schema::TableSchema;
use crate::error::{KathamoError, Result};
use rusqlite::Connection;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStep {
    ReadColumns,
    BuildTemp,
    CopyRows,
    DropOriginal,
    RenameTemp,
    Done,
}

impl fmt::Display for RebuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebuildStep::ReadColumns => "read-columns",
            RebuildStep::BuildTemp => "build-temp",
            RebuildStep::CopyRows => "copy-rows",
            RebuildStep::DropOriginal => "drop-original",
            RebuildStep::RenameTemp => "rename-temp",
            RebuildStep::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// State of one reconstruction that removes `target` from a table
pub struct TableRebuild<'a> {
    schema: &'a dyn TableSchema,
    target: String,
    temp_table: String,
    step: RebuildStep,
    /// Columns copied into the rebuilt table, base columns first
    kept_columns: Vec<String>,
    /// Custom columns that survive the rebuild
    kept_custom: Vec<String>,
}

impl<'a> TableRebuild<'a> {
    pub fn new(schema: &'a dyn TableSchema, target: &str) -> Self {
        Self {
            schema,
            target: target.to_string(),
            temp_table: format!("{}__rebuild", schema.table_name()),
            step: RebuildStep::ReadColumns,
            kept_columns: Vec::new(),
            kept_custom: Vec::new(),
        }
    }

    pub fn step(&self) -> RebuildStep {
        self.step
    }

    pub fn temp_table(&self) -> &str {
        &self.temp_table
    }

    /// Custom columns that will be (or were) carried over
    pub fn kept_custom(&self) -> &[String] {
        &self.kept_custom
    }

    /// Run the current step; on success move to the next one
    pub fn advance(&mut self, conn: &Connection) -> Result<RebuildStep> {
        let next = match self.step {
            RebuildStep::ReadColumns => {
                self.read_columns(conn)?;
                RebuildStep::BuildTemp
            }
            RebuildStep::BuildTemp => {
                self.build_temp(conn)?;
                RebuildStep::CopyRows
            }
            RebuildStep::CopyRows => {
                self.copy_rows(conn)?;
                RebuildStep::DropOriginal
            }
            RebuildStep::DropOriginal => {
                conn.execute(&format!("DROP TABLE {}", quote(self.schema.table_name())), [])?;
                RebuildStep::RenameTemp
            }
            RebuildStep::RenameTemp => {
                conn.execute(
                    &format!(
                        "ALTER TABLE {} RENAME TO {}",
                        quote(&self.temp_table),
                        quote(self.schema.table_name())
                    ),
                    [],
                )?;
                RebuildStep::Done
            }
            RebuildStep::Done => RebuildStep::Done,
        };
        debug!(table = self.schema.table_name(), from = %self.step, to = %next, "rebuild step");
        self.step = next;
        Ok(next)
    }

    /// Drive every remaining step inside one transaction
    pub fn run(&mut self, conn: &Connection) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        while self.step != RebuildStep::Done {
            if let Err(e) = self.advance(&tx) {
                warn!(
                    table = self.schema.table_name(),
                    column = %self.target,
                    step = %self.step,
                    error = %e,
                    "table rebuild failed, rolling back"
                );
                return Err(e);
            }
        }
        tx.commit()?;

        info!(
            table = self.schema.table_name(),
            column = %self.target,
            kept = self.kept_custom.len(),
            "rebuilt table without column"
        );
        Ok(())
    }

    fn read_columns(&mut self, conn: &Connection) -> Result<()> {
        let dialect = BackendKind::Sqlite.dialect();
        let mut stmt = conn.prepare(dialect.columns_sql)?;
        let current = stmt
            .query_map([self.schema.table_name()], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if !current.iter().any(|c| c.eq_ignore_ascii_case(&self.target)) {
            return Err(KathamoError::ColumnNotFound {
                table: self.schema.table_name().to_string(),
                column: self.target.clone(),
            });
        }

        let base = self.schema.base_columns();
        self.kept_custom = current
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(&self.target) && !self.schema.is_base_column(c))
            .cloned()
            .collect();
        self.kept_columns = base
            .iter()
            .filter(|b| current.iter().any(|c| c.eq_ignore_ascii_case(b)))
            .map(|b| b.to_string())
            .chain(self.kept_custom.iter().cloned())
            .collect();
        Ok(())
    }

    fn build_temp(&self, conn: &Connection) -> Result<()> {
        let dialect = BackendKind::Sqlite.dialect();
        // Left behind by a rebuild that died outside a transaction
        conn.execute(&format!("DROP TABLE IF EXISTS {}", quote(&self.temp_table)), [])?;

        let mut columns = vec![self
            .schema
            .base_columns_ddl(BackendKind::Sqlite)
            .trim()
            .to_string()];
        columns.extend(
            self.kept_custom
                .iter()
                .map(|c| format!("{} {}", quote(c), dialect.custom_column_type)),
        );

        conn.execute(
            &format!(
                "CREATE TABLE {} ({})",
                quote(&self.temp_table),
                columns.join(", ")
            ),
            [],
        )?;
        Ok(())
    }

    fn copy_rows(&self, conn: &Connection) -> Result<()> {
        let cols = self
            .kept_columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        let copied = conn.execute(
            &format!(
                "INSERT INTO {} ({cols}) SELECT {cols} FROM {}",
                quote(&self.temp_table),
                quote(self.schema.table_name()),
            ),
            [],
        )?;
        debug!(table = self.schema.table_name(), rows = copied, "copied rows");
        Ok(())
    }
}

fn quote(ident: &str) -> String {
    BackendKind::Sqlite.dialect().quote_ident(ident)
}
