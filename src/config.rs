use crate::database::BackendKind;
use crate::error::{KathamoError, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Connection settings for the client/server backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "kathamo".to_string(),
            max_connections: 10,
        }
    }
}

/// What [`Database::connect`](crate::database::Database::connect) needs to open a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// File-based SQLite; `None` means in-memory
    Sqlite { path: Option<String> },
    MySql(MySqlSettings),
}

impl DatabaseConfig {
    pub fn backend_kind(&self) -> BackendKind {
        match self {
            DatabaseConfig::Sqlite { .. } => BackendKind::Sqlite,
            DatabaseConfig::MySql(_) => BackendKind::MySql,
        }
    }
}

pub struct KathamoConfig {
    /// Backend selected with `db_type`
    pub backend: BackendKind,

    /// Path of the SQLite database file
    pub sqlite_path: String,

    /// MySQL connection settings
    pub mysql: MySqlSettings,
}

impl Default for KathamoConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            sqlite_path: "./kathamo.db".to_string(),
            mysql: MySqlSettings::default(),
        }
    }
}

impl KathamoConfig {
    /// Load the configuration
    ///
    /// Sources, lowest precedence first: built-in defaults, the TOML file at
    /// `path` (or `~/.kathamo/kathamo.toml` when present), a `.env` file in the
    /// working directory, and `KATHAMO_*` environment variables.
    pub fn new(path: &Option<String>) -> Result<KathamoConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                if !Path::new(p.as_str()).exists() {
                    return Err(KathamoError::Config(format!(
                        "configuration file '{}' does not exist",
                        p
                    )));
                }
                builder = builder.add_source(config::File::with_name(p.as_str()));
            }
            None => {
                let default_path = Self::config_file_path();
                if Path::new(default_path.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(default_path.as_str()));
                }
            }
        }

        // .env only feeds the process environment; it is never created here
        apply_dotenv(dotenvy::dotenv())?;

        // E.g., `KATHAMO_DB_TYPE=mysql kathamo status` selects the MySQL backend
        builder = builder.add_source(config::Environment::with_prefix("KATHAMO"));

        let settings = builder.build()?;
        let config = settings.try_deserialize::<HashMap<String, String>>()?;

        Self::from_map(&config)
    }

    /// Build a configuration from flat `db_*` keys, falling back to defaults
    pub fn from_map(config: &HashMap<String, String>) -> Result<KathamoConfig> {
        let defaults = KathamoConfig::default();

        let backend = match config.get("db_type") {
            Some(t) => t.parse::<BackendKind>().map_err(KathamoError::Config)?,
            None => defaults.backend,
        };

        let sqlite_path = config
            .get("db_path")
            .cloned()
            .unwrap_or(defaults.sqlite_path);

        let port = match config.get("db_port") {
            Some(p) => p
                .parse()
                .map_err(|e| KathamoError::Config(format!("invalid db_port '{}': {}", p, e)))?,
            None => defaults.mysql.port,
        };

        let max_connections = match config.get("db_max_connections") {
            Some(n) => n.parse().map_err(|e| {
                KathamoError::Config(format!("invalid db_max_connections '{}': {}", n, e))
            })?,
            None => defaults.mysql.max_connections,
        };

        let mysql = MySqlSettings {
            host: config.get("db_host").cloned().unwrap_or(defaults.mysql.host),
            port,
            user: config.get("db_user").cloned().unwrap_or(defaults.mysql.user),
            password: config
                .get("db_password")
                .cloned()
                .unwrap_or(defaults.mysql.password),
            database: config
                .get("db_name")
                .cloned()
                .unwrap_or(defaults.mysql.database),
            max_connections,
        };

        Ok(KathamoConfig {
            backend,
            sqlite_path,
            mysql,
        })
    }

    /// The connection input for the selected backend
    pub fn database_config(&self) -> DatabaseConfig {
        match self.backend {
            BackendKind::Sqlite => DatabaseConfig::Sqlite {
                path: Some(self.sqlite_path.clone()),
            },
            BackendKind::MySql => DatabaseConfig::MySql(self.mysql.clone()),
        }
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Backend:            {}", self.backend)];
        match self.backend {
            BackendKind::Sqlite => {
                lines.push(format!("SQLite Path:        {}", self.sqlite_path));
            }
            BackendKind::MySql => {
                let password = if self.mysql.password.is_empty() {
                    "(empty)"
                } else {
                    "********"
                };
                lines.push(format!(
                    "MySQL Server:       {}:{}",
                    self.mysql.host, self.mysql.port
                ));
                lines.push(format!("MySQL User:         {}", self.mysql.user));
                lines.push(format!("MySQL Password:     {}", password));
                lines.push(format!("MySQL Database:     {}", self.mysql.database));
                lines.push(format!(
                    "Max Connections:    {}",
                    self.mysql.max_connections
                ));
            }
        }
        lines.join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.kathamo/kathamo.toml", home_dir)
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not
fn apply_dotenv(result: dotenvy::Result<PathBuf>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(KathamoError::Config(format!("failed to load .env: {}", e))),
    }
}
