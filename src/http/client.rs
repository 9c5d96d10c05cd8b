//! HTTP transport for the FEC API
//!
//! A thin wrapper over reqwest: joins resource paths onto the API base URL,
//! applies the timeout and optional pacing, and turns anything but a 2xx
//! into [`FetchFailure::Status`].
//!
//! Each call is attempted once; retry policy belongs to the caller.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::cursor::QueryParams;
use crate::error::{Error, FetchFailure, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API root that resource paths are joined onto
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Pacing configuration; `None` sends requests as fast as the caller asks
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: Vec<(String, String)>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: Vec::new(),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the API root
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Enable request pacing
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Send `key: value` with every request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((key.into(), value.into()));
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Single-attempt HTTP client
pub struct HttpClient {
    client: Client,
    base_url: Option<String>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client from its configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::invalid_value("header", format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_value("header", format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("fec-extract/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
        })
    }

    /// GET `path` with `query` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
    ) -> std::result::Result<T, FetchFailure> {
        let url = self.resource_url(path);

        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(url = %url, status = status.as_u16(), "Request succeeded");
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Join a resource path onto the base URL
    fn resource_url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("paced", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
