//! Client configuration
//!
//! Loaded from `~/.ludex/config.toml`. Every field has a default, so a missing
//! file or a missing section is not an error.
//!
//! Base URL resolution order:
//! 1. Explicit override (CLI `--api-url`)
//! 2. `LUDEX_API_URL` environment variable
//! 3. Config file `[api] base_url`
//! 4. Built-in default

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::policy::{AnalyticVocabulary, DEFAULT_EXEMPT_TERMS};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";
const API_URL_ENV: &str = "LUDEX_API_URL";

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Ask the backend to fall back to DBpedia for title searches
    #[serde(default = "default_true")]
    pub hybrid: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            hybrid: true,
        }
    }
}

/// Incremental search tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_exempt_terms")]
    pub exempt_terms: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_len: default_min_query_len(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            cache_capacity: default_cache_capacity(),
            exempt_terms: default_exempt_terms(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn exemption_policy(&self) -> AnalyticVocabulary {
        AnalyticVocabulary::new(&self.exempt_terms)
    }
}

/// Result presentation settings
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// User language; non-English languages get translated DBpedia links
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_min_query_len() -> usize {
    2
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_cache_capacity() -> usize {
    100
}

fn default_exempt_terms() -> Vec<String> {
    DEFAULT_EXEMPT_TERMS.iter().map(|t| t.to_string()).collect()
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Default config location
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".ludex")
            .join("config.toml")
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns `Error::Config` if the text is not valid TOML for this schema.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file, falling back to defaults when the file
    /// is missing or invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read config {:?}: {}", path, e);
                return Self::default();
            }
        };

        match Self::from_toml(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Resolve the backend base URL from an explicit override, the
    /// environment, then the config file.
    pub fn resolve_base_url(&self, explicit: Option<&str>) -> String {
        if let Some(url) = explicit.filter(|u| !u.is_empty()) {
            debug!("Using API URL from command line");
            return url.trim_end_matches('/').to_string();
        }

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                debug!("Using API URL from {} env var", API_URL_ENV);
                return url.trim_end_matches('/').to_string();
            }
        }

        self.api.base_url.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search.debounce(), Duration::from_millis(800));
        assert_eq!(config.search.min_query_len, 2);
        assert_eq!(config.search.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.search.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.display.language, "en");
        assert!(config.api.hybrid);
        assert!(config.search.exempt_terms.iter().any(|t| t == "best"));
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            [api]
            base_url = "http://games.local:8080/"

            [search]
            debounce_ms = 250
            exempt_terms = ["ranking"]
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.search.debounce_ms, 250);
        assert_eq!(config.search.cache_capacity, 100);
        assert!(config.search.exemption_policy().terms().len() == 1);
        assert_eq!(
            config.resolve_base_url(Some("http://override:1/")),
            "http://override:1"
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[search]\ndebounce_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/ludex/config.toml"));
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }
}
