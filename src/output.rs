//! Output formatting for command results
//!
//! Every command result can be printed as a table or as JSON. JSON formats
//! only need `serde`; tables require the `display` feature.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Rounded table (default)
    #[default]
    Table,
    /// Markdown table
    Markdown,
    /// Compact JSON array
    Json,
    /// Pretty-printed JSON array
    JsonPretty,
    /// One JSON object per line
    JsonLine,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "markdown", "json", "json-pretty", "json-line"]
    }

    /// Serialize items in one of the JSON formats
    ///
    /// Returns `None` for table formats.
    pub fn to_json<T: Serialize>(&self, items: &[T]) -> Option<String> {
        let rendered = match self {
            Self::Json => serde_json::to_string(items).unwrap_or_default(),
            Self::JsonPretty => serde_json::to_string_pretty(items).unwrap_or_default(),
            Self::JsonLine => items
                .iter()
                .filter_map(|item| serde_json::to_string(item).ok())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Table | Self::Markdown => return None,
        };
        Some(rendered)
    }

    /// Render items as a table or JSON, depending on the format
    #[cfg(feature = "display")]
    pub fn render<T: Serialize + tabled::Tabled>(&self, items: &[T]) -> String {
        use tabled::settings::Style;
        use tabled::Table;

        if let Some(json) = self.to_json(items) {
            return json;
        }
        match self {
            Self::Markdown => Table::new(items).with(Style::markdown()).to_string(),
            _ => Table::new(items).with(Style::rounded()).to_string(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}
