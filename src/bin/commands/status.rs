use anyhow::Result;
use kathamo::{BackendKind, Database, KathamoConfig, OutputFormat, TableSchema};
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize)]
struct Status {
    backend: BackendKind,
    location: String,
    tables: Vec<TableStatus>,
}

#[derive(Debug, Serialize, Tabled)]
struct TableStatus {
    table: String,
    exists: bool,
    rows: u64,
    custom_columns: String,
}

pub async fn run(
    config: &KathamoConfig,
    db: &Database,
    schemas: &[&dyn TableSchema],
    format: OutputFormat,
) -> Result<()> {
    let mut tables = Vec::with_capacity(schemas.len());
    for schema in schemas {
        tables.push(table_status(db, *schema).await?);
    }

    if format.is_json() {
        let location = match config.backend {
            BackendKind::Sqlite => config.sqlite_path.clone(),
            BackendKind::MySql => format!(
                "{}:{}/{}",
                config.mysql.host, config.mysql.port, config.mysql.database
            ),
        };
        let status = Status {
            backend: config.backend,
            location,
            tables,
        };
        let json = match format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&status)?,
            _ => serde_json::to_string(&status)?,
        };
        println!("{}", json);
    } else {
        println!("Kathamo Status");
        println!("==============\n");
        println!("{}\n", config.summary());
        println!("{}", format.render(&tables));
    }
    Ok(())
}

async fn table_status(db: &Database, schema: &dyn TableSchema) -> Result<TableStatus> {
    let table = schema.table_name();
    if !db.table_exists(table).await? {
        return Ok(TableStatus {
            table: table.to_string(),
            exists: false,
            rows: 0,
            custom_columns: String::new(),
        });
    }

    #[derive(serde::Deserialize)]
    struct Count {
        count: u64,
    }
    let sql = format!(
        "SELECT COUNT(*) AS count FROM {}",
        db.dialect().quote_ident(table)
    );
    let rows = db
        .query::<Count>(&sql, &[])
        .await?
        .first()
        .map(|c| c.count)
        .unwrap_or(0);

    let custom_columns = db
        .table_columns(table)
        .await?
        .into_iter()
        .filter(|c| !schema.is_base_column(c))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(TableStatus {
        table: table.to_string(),
        exists: true,
        rows,
        custom_columns,
    })
}
