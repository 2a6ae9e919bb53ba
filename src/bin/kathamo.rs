use anyhow::Result;
use clap::{Parser, Subcommand};
use kathamo::*;
use tracing::Level;

mod commands;

use commands::users::UsersArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.kathamo/kathamo.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backend settings and the state of managed tables
    Status,

    /// Create and seed any managed table that does not exist yet
    Bootstrap,

    /// List the columns of the users table
    Columns,

    /// Add a custom column to the users table
    AddColumn {
        /// Column name (letters, digits and underscores)
        name: String,

        /// Requested type, e.g. TEXT or VARCHAR(64); stored as text
        #[clap(value_name = "TYPE")]
        sql_type: String,
    },

    /// Remove a custom column from the users table
    DropColumn {
        /// Column name
        name: String,
    },

    /// Inspect and create users
    Users(UsersArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(level) = log_level(cli.debug) {
        tracing_subscriber::fmt().with_max_level(level).init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// `--debug` shows executed statements and rebuild steps
fn log_level(debug: bool) -> Option<Level> {
    debug.then_some(Level::DEBUG)
}

async fn run(cli: Cli) -> Result<()> {
    let config = KathamoConfig::new(&cli.config)?;
    let db = Database::connect(&config.database_config()).await?;
    let users = UserSchema::default();
    let format = cli.format;

    let result = match cli.command {
        Commands::Status => commands::status::run(&config, &db, &[&users], format).await,
        Commands::Bootstrap => commands::schema::run_bootstrap(&db, &[&users], format).await,
        Commands::Columns => commands::schema::run_columns(&db, &users, format).await,
        Commands::AddColumn { name, sql_type } => {
            commands::schema::run_add_column(&db, &users, &name, &sql_type).await
        }
        Commands::DropColumn { name } => {
            commands::schema::run_drop_column(&db, &users, &name).await
        }
        Commands::Users(args) => commands::users::run(&db, &users, args, format).await,
    };

    db.close().await?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_enables_debug_events() {
        assert_eq!(log_level(false), None);
        assert_eq!(log_level(true), Some(Level::DEBUG));
    }

    #[test]
    fn test_cli_parses_format() {
        let cli = Cli::parse_from(["kathamo", "--format", "json", "columns"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Columns));
    }
}
