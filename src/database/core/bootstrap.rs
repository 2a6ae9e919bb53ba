//! Startup table bootstrap
//!
//! Run once before anything else touches the schema: every registered table
//! that does not exist yet is created and seeded.

use crate::database::core::connection::Database;
use crate::database::core::schema::TableSchema;
use crate::error::{BootstrapStage, KathamoError, Result};
use tracing::{info, warn};

/// Ensure every schema's table exists
///
/// Returns one flag per schema, in input order: `true` when the table already
/// existed and was left untouched, `false` when it was created (and seeded)
/// by this call.
///
/// Existence-check failures are returned as-is. A failed CREATE or seed is
/// wrapped in [`KathamoError::SchemaBootstrap`]; tables handled earlier in the
/// same call are not rolled back. When only the seed fails, the table is left
/// in place without its seed row.
pub async fn bootstrap(db: &Database, schemas: &[&dyn TableSchema]) -> Result<Vec<bool>> {
    let mut existed = Vec::with_capacity(schemas.len());

    for schema in schemas {
        let table = schema.table_name();
        if db.table_exists(table).await? {
            info!(table, "table exists");
            existed.push(true);
            continue;
        }

        info!(table, backend = %db.backend_kind(), "creating table");
        db.execute(&schema.create_table_sql(db.backend_kind()), &[])
            .await
            .map_err(|e| bootstrap_error(table, BootstrapStage::Create, e))?;

        if let Some(seed) = schema.default_seed_row() {
            let sql = seed.insert_sql(db.dialect(), table);
            if let Err(e) = db.execute(&sql, &seed.values).await {
                warn!(table, error = %e, "table created but seeding failed");
                return Err(bootstrap_error(table, BootstrapStage::Seed, e));
            }
            info!(table, "seeded table");
        }

        existed.push(false);
    }

    Ok(existed)
}

fn bootstrap_error(table: &str, stage: BootstrapStage, source: KathamoError) -> KathamoError {
    KathamoError::SchemaBootstrap {
        table: table.to_string(),
        stage,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::dialect::BackendKind;
    use crate::database::core::schema::SeedRow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSchema {
        name: &'static str,
        seed_calls: AtomicUsize,
        seed_ok: bool,
    }

    impl CountingSchema {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                seed_calls: AtomicUsize::new(0),
                seed_ok: true,
            }
        }
    }

    impl TableSchema for CountingSchema {
        fn table_name(&self) -> &str {
            self.name
        }

        fn base_columns(&self) -> &[&'static str] {
            &["id", "label"]
        }

        fn base_columns_ddl(&self, _kind: BackendKind) -> &'static str {
            "id INTEGER PRIMARY KEY, label TEXT NOT NULL"
        }

        fn default_seed_row(&self) -> Option<SeedRow> {
            self.seed_calls.fetch_add(1, Ordering::SeqCst);
            let seed = SeedRow::new().with("id", 1_i64);
            // NOT NULL label makes the insert fail
            Some(if self.seed_ok { seed.with("label", "first") } else { seed })
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_then_skips() {
        let db = Database::open_in_memory().await.unwrap();
        let a = CountingSchema::new("alpha");
        let b = CountingSchema::new("beta");

        let first = bootstrap(&db, &[&a, &b]).await.unwrap();
        assert_eq!(first, vec![false, false]);

        let second = bootstrap(&db, &[&a, &b]).await.unwrap();
        assert_eq!(second, vec![true, true]);

        // Seeded once, on the first run only
        assert_eq!(a.seed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.seed_calls.load(Ordering::SeqCst), 1);
        let rows = db.query_rows("SELECT * FROM alpha", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_reports_existing_table() {
        let db = Database::open_in_memory().await.unwrap();
        db.execute("CREATE TABLE alpha (id INTEGER PRIMARY KEY)", &[])
            .await
            .unwrap();

        let a = CountingSchema::new("alpha");
        let b = CountingSchema::new("beta");
        assert_eq!(bootstrap(&db, &[&a, &b]).await.unwrap(), vec![true, false]);
        assert_eq!(a.seed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_seed_failure_leaves_table_unseeded() {
        let db = Database::open_in_memory().await.unwrap();
        let mut bad = CountingSchema::new("alpha");
        bad.seed_ok = false;

        let err = bootstrap(&db, &[&bad]).await.unwrap_err();
        assert!(matches!(
            err,
            KathamoError::SchemaBootstrap { stage: BootstrapStage::Seed, .. }
        ));

        assert!(db.table_exists("alpha").await.unwrap());
        let rows = db.query_rows("SELECT * FROM alpha", &[]).await.unwrap();
        assert!(rows.is_empty());

        // A later run sees the table and leaves it alone
        assert_eq!(bootstrap(&db, &[&bad]).await.unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_bootstrap_on_closed_connection() {
        let db = Database::open_in_memory().await.unwrap();
        db.close().await.unwrap();

        let a = CountingSchema::new("alpha");
        let err = bootstrap(&db, &[&a]).await.unwrap_err();
        assert!(matches!(err, KathamoError::Connection(_)));
    }
}
