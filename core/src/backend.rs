//! HTTP backend for the game catalog API
//!
//! `SearchBackend` is the seam the controller talks to; `Catalog` covers the
//! non-search endpoints. `HttpBackend` implements both over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::token::CancelToken;
use crate::types::{ResultSet, SearchField, Statistics};

/// Issues one search request. Implementations must return `Error::Canceled`
/// (or any result; the caller discards it) once `token` is cancelled.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(
        &self,
        field: SearchField,
        query: &str,
        token: &CancelToken,
    ) -> Result<ResultSet>;
}

/// Catalog-wide operations that are not tied to a search box.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_all(&self) -> Result<ResultSet>;
    async fn statistics(&self) -> Result<Statistics>;
    /// Ask the backend to import up to `limit` games. Mutates the dataset.
    async fn populate(&self, limit: u32) -> Result<String>;
}

#[derive(Serialize)]
struct PopulateRequest {
    limite: u32,
}

#[derive(Deserialize)]
struct PopulateResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    hybrid: bool,
}

impl HttpBackend {
    /// Create a backend for `base_url`. A path prefix in the base URL is
    /// kept ("http://host/app" sends searches to "/app/api/...").
    ///
    /// # Errors
    /// Returns `Error::InvalidUrl` for an unparsable base URL and
    /// `Error::Http` if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, hybrid: bool) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
        // Endpoints are joined relatively, which replaces the last path
        // segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ludex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            hybrid,
        })
    }

    /// Create a backend from the `[api]` config section.
    pub fn from_config(base_url: &str, api: &ApiConfig) -> Result<Self> {
        Self::new(base_url, Duration::from_secs(api.timeout_secs), api.hybrid)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Build the request URL for a field search.
    pub fn search_url(&self, field: SearchField, query: &str) -> Result<Url> {
        let (path, param) = field.endpoint();
        let mut url = self.url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(param, query);
            if self.hybrid && field == SearchField::Title {
                pairs.append_pair("hybrid", "true");
            }
        }
        Ok(url)
    }

    // Body is read as text and parsed separately so a malformed payload
    // surfaces as Error::Serialization.
    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!("GET {}", url);
        let body = self.client.get(url).send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(
        &self,
        field: SearchField,
        query: &str,
        token: &CancelToken,
    ) -> Result<ResultSet> {
        let url = self.search_url(field, query)?;

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Canceled),
            result = self.get_json(url) => result.map(ResultSet::new),
        }
    }
}

#[async_trait]
impl Catalog for HttpBackend {
    async fn list_all(&self) -> Result<ResultSet> {
        let url = self.url("api/listar")?;
        self.get_json(url).await.map(ResultSet::new)
    }

    async fn statistics(&self) -> Result<Statistics> {
        let url = self.url("api/estadisticas")?;
        let value = self.get_json(url).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn populate(&self, limit: u32) -> Result<String> {
        let url = self.url("api/poblar")?;
        debug!("POST {} (limit: {})", url, limit);

        let body = self
            .client
            .post(url)
            .json(&PopulateRequest { limite: limit })
            .send()
            .await?
            .text()
            .await?;
        let response: PopulateResponse = serde_json::from_str(&body)?;

        if response.success {
            Ok(response
                .message
                .unwrap_or_else(|| format!("{} games added", limit)))
        } else {
            Err(Error::Backend(
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(hybrid: bool) -> HttpBackend {
        HttpBackend::new("http://127.0.0.1:5001", Duration::from_secs(1), hybrid)
            .expect("valid backend")
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = backend(false)
            .search_url(SearchField::Title, "the last of us & co")
            .unwrap();
        assert_eq!(url.path(), "/api/buscar/titulo");
        assert_eq!(url.query(), Some("q=the+last+of+us+%26+co"));
    }

    #[test]
    fn test_hybrid_flag_only_on_title() {
        let b = backend(true);
        let title = b.search_url(SearchField::Title, "halo").unwrap();
        assert_eq!(title.query(), Some("q=halo&hybrid=true"));

        let year = b.search_url(SearchField::Year, "2020").unwrap();
        assert_eq!(year.path(), "/api/buscar/anio");
        assert_eq!(year.query(), Some("anio=2020"));
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let b = HttpBackend::new("http://127.0.0.1:5001/app", Duration::from_secs(1), false)
            .expect("valid backend");
        assert_eq!(b.base_url().as_str(), "http://127.0.0.1:5001/app/");

        let url = b.search_url(SearchField::Developer, "valve").unwrap();
        assert_eq!(url.path(), "/app/api/buscar/desarrollador");
        assert_eq!(b.url("api/listar").unwrap().path(), "/app/api/listar");

        let slashed = HttpBackend::new("http://127.0.0.1:5001/app/", Duration::from_secs(1), false)
            .expect("valid backend");
        assert_eq!(slashed.base_url(), b.base_url());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackend::new("not a url", Duration::from_secs(1), false);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
