//! Content API client
//!
//! Authenticated JSON reads against the headless CMS REST API. The transport
//! sits behind the [`ContentApi`] trait so the aggregator can be exercised
//! against an in-memory stub.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::Pagination;
use crate::config::ServiceConfig;

/// Errors that can occur when reading from the content API
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The requested record does not exist
    #[error("Resource not found")]
    NotFound,

    /// The API answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON parsed but lacks an expected field
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// The configured base URL can't be turned into a request URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Read access to the content API
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Issue a GET for the resource below the API root named by `path` and
    /// return the parsed JSON body
    ///
    /// Each element of `path` is one URL path segment and is escaped as such,
    /// so ids containing `/`, `?` or `#` can't change the requested resource.
    async fn get_json(
        &self,
        path: &[&str],
        query: &[(String, String)],
    ) -> Result<Value, FetchError>;
}

/// Paginated list envelope returned by collection endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub docs: Vec<T>,
    #[serde(default)]
    pub total_docs: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_prev_page: bool,
}

impl<T> Paginated<T> {
    /// The envelope's pagination metadata
    pub fn pagination(&self) -> Pagination {
        Pagination {
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

/// Deserializes an API body into `T`, reporting a parse failure
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    Ok(serde_json::from_value(value)?)
}

/// Client for the content API over HTTP
#[derive(Debug, Clone)]
pub struct HttpContentApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpContentApi {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    /// Create a client from service configuration
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// Use a custom HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Full URL for a resource, one escaped segment per element of `path`
    fn url(&self, path: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    /// Authorization header value, when an API key is configured
    fn auth_header(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| format!("users API-Key {}", key))
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn get_json(
        &self,
        path: &[&str],
        query: &[(String, String)],
    ) -> Result<Value, FetchError> {
        let mut request = self.client.get(self.url(path)?).query(query);
        if let Some(auth) = self.auth_header() {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
