use anyhow::Result;
use kathamo::{bootstrap, Database, OutputFormat, SchemaEvolver, TableSchema};
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct BootstrapEntry {
    table: String,
    existed: bool,
    action: &'static str,
}

#[derive(Debug, Serialize, Tabled)]
struct ColumnEntry {
    name: String,
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    sql_type: String,
    kind: &'static str,
}

pub async fn run_bootstrap(
    db: &Database,
    schemas: &[&dyn TableSchema],
    format: OutputFormat,
) -> Result<()> {
    let existed = bootstrap(db, schemas).await?;

    let entries: Vec<BootstrapEntry> = schemas
        .iter()
        .zip(existed)
        .map(|(schema, existed)| BootstrapEntry {
            table: schema.table_name().to_string(),
            existed,
            action: if existed { "none" } else { "created" },
        })
        .collect();

    println!("{}", format.render(&entries));
    Ok(())
}

pub async fn run_columns(db: &Database, schema: &dyn TableSchema, format: OutputFormat) -> Result<()> {
    bootstrap(db, &[schema]).await?;

    let entries: Vec<ColumnEntry> = SchemaEvolver::new(db, schema)
        .column_defs()
        .await?
        .into_iter()
        .map(|def| {
            let kind = if schema.is_base_column(&def.name) {
                "base"
            } else {
                "custom"
            };
            ColumnEntry {
                name: def.name,
                sql_type: def.sql_type,
                kind,
            }
        })
        .collect();

    println!("{}", format.render(&entries));
    Ok(())
}

pub async fn run_add_column(
    db: &Database,
    schema: &dyn TableSchema,
    name: &str,
    sql_type: &str,
) -> Result<()> {
    bootstrap(db, &[schema]).await?;
    SchemaEvolver::new(db, schema)
        .add_column(name, sql_type)
        .await?;
    println!("Added column '{}' to '{}'", name, schema.table_name());
    Ok(())
}

pub async fn run_drop_column(db: &Database, schema: &dyn TableSchema, name: &str) -> Result<()> {
    bootstrap(db, &[schema]).await?;
    SchemaEvolver::new(db, schema).delete_column(name).await?;
    println!("Dropped column '{}' from '{}'", name, schema.table_name());
    Ok(())
}
