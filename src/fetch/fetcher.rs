//! Page fetcher implementations

use super::types::Page;
use crate::config::ExtractorConfig;
use crate::cursor::QueryParams;
use crate::error::{Error, Result};
use crate::http::{CallBudget, HttpClient, HttpClientConfig, RateLimiterConfig};
use async_trait::async_trait;
use tracing::{debug, error};

/// Fetches a single page of a paginated resource
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue one request for `endpoint` with `params` and decode the page.
    ///
    /// Fails with [`Error::QuotaExceeded`] without touching the network when
    /// the call budget is spent, and with [`Error::Fetch`] for transport,
    /// status and decoding failures. Never retries.
    async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Page>;
}

/// [`PageFetcher`] over HTTP, guarded by a [`CallBudget`]
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: HttpClient,
    budget: CallBudget,
}

impl HttpPageFetcher {
    /// Create a fetcher from a client and a (possibly shared) budget
    pub fn new(client: HttpClient, budget: CallBudget) -> Self {
        Self { client, budget }
    }

    /// Build the HTTP client from process configuration
    pub fn from_config(config: &ExtractorConfig, budget: CallBudget) -> Result<Self> {
        let mut http = HttpClientConfig::builder()
            .base_url(&config.base_url)
            .timeout(config.timeout)
            .header("Accept", "application/json");
        if let Some(rps) = config.requests_per_second {
            http = http.rate_limit(RateLimiterConfig::per_second(rps));
        }
        Ok(Self::new(HttpClient::with_config(http.build())?, budget))
    }

    /// The budget this fetcher draws from
    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Page> {
        if !self.budget.try_consume() {
            return Err(Error::QuotaExceeded {
                limit: self.budget.limit(),
            });
        }

        debug!(
            endpoint,
            call = self.budget.issued(),
            limit = self.budget.limit(),
            "Fetching page"
        );

        self.client
            .get_json::<Page>(endpoint, params)
            .await
            .map_err(|e| {
                error!(endpoint, error = %e, "Failed to fetch data from FEC API");
                Error::fetch(endpoint, e)
            })
    }
}
