//! Core data types for Ludex
//!
//! These types are shared between the controller, the HTTP backend and the CLI.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Catalog field a search is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Year,
    Developer,
}

impl SearchField {
    /// Return the lowercase string representation used in logs and the CLI.
    ///
    /// # Returns
    /// String slice for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Year => "year",
            SearchField::Developer => "developer",
        }
    }

    /// Backend path (relative to the base URL) and query parameter name.
    pub(crate) fn endpoint(&self) -> (&'static str, &'static str) {
        match self {
            SearchField::Title => ("api/buscar/titulo", "q"),
            SearchField::Year => ("api/buscar/anio", "anio"),
            SearchField::Developer => ("api/buscar/desarrollador", "q"),
        }
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
    Success,
}

impl Severity {
    /// Return the lowercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Success => "success",
        }
    }
}

/// Opaque backend response envelope.
///
/// The controller only looks at `success` and `error`; everything else is
/// passed through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(pub Value);

impl ResultSet {
    /// Wrap a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Whether the backend reported success. A missing flag counts as failure.
    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Backend-supplied error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// Result count as reported by the backend (`count` or `total_count`).
    pub fn count(&self) -> u64 {
        self.0
            .get("count")
            .or_else(|| self.0.get("total_count"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Borrow the raw JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Where a game entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Dbpedia,
}

impl Source {
    /// Return the lowercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Local => "local",
            Source::Dbpedia => "dbpedia",
        }
    }
}

/// A single game as returned inside a search envelope.
///
/// # Fields
/// - `titulo`: Game title.
/// - `anios`: Release years, possibly several.
/// - `desarrollador`: Optional developer name.
/// - `generos`: Genre labels.
/// - `uri`: Resource URI (DBpedia results sometimes use `game` instead).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    #[serde(default)]
    pub titulo: String,
    #[serde(default, deserialize_with = "years")]
    pub anios: Vec<String>,
    #[serde(default)]
    pub desarrollador: Option<String>,
    #[serde(default)]
    pub generos: Vec<String>,
    #[serde(default, alias = "game")]
    pub uri: Option<String>,
}

// Years arrive as numbers or strings depending on the endpoint.
fn years<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

impl ResultSet {
    /// Collect the game entries carried by the envelope, tagged by source.
    ///
    /// Flat envelopes keep their items under `data`; hybrid envelopes split
    /// them into `local.results` and `dbpedia.results`.
    pub fn entries(&self) -> Vec<(Source, GameEntry)> {
        let mut out = Vec::new();

        if let Some(items) = self.0.get("data").and_then(Value::as_array) {
            let source = match self.0.get("source").and_then(Value::as_str) {
                Some("dbpedia") => Source::Dbpedia,
                _ => Source::Local,
            };
            out.extend(parse_entries(items).into_iter().map(|e| (source, e)));
        }

        for (key, source) in [("local", Source::Local), ("dbpedia", Source::Dbpedia)] {
            if let Some(items) = self
                .0
                .get(key)
                .and_then(|section| section.get("results"))
                .and_then(Value::as_array)
            {
                out.extend(parse_entries(items).into_iter().map(|e| (source, e)));
            }
        }

        out
    }
}

fn parse_entries(items: &[Value]) -> Vec<GameEntry> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Genre popularity row from the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreCount {
    pub nombre: String,
    pub count: u64,
}

/// Catalog statistics.
///
/// # Fields
/// - `total`: Number of games in the local catalog.
/// - `generos_populares`: Most common genres with their counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub generos_populares: Vec<GenreCount>,
}
