//! HTML page fetching
//!
//! The listing scraper and hoster resolver only need raw page bytes, so they
//! talk to a [`PageFetcher`] rather than to reqwest directly. [`HttpFetcher`]
//! is the production implementation; tests substitute canned pages.

use crate::config::HttpConfig;
use crate::error::{ConfigError, FetchError};
use async_trait::async_trait;
use tracing::debug;

/// Fetches a page body by URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the raw body bytes
    ///
    /// Non-2xx responses are [`FetchError::HttpStatus`]; transport failures
    /// and timeouts are [`FetchError::Network`]. No retries.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Build the shared reqwest client from the HTTP configuration
///
/// `with_proxy` decides whether [`HttpConfig::proxy`] is applied, so the
/// debrid client can opt out of the proxy the listing fetches use.
pub(crate) fn build_client(
    config: &HttpConfig,
    with_proxy: bool,
) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.request_timeout);

    if with_proxy && let Some(proxy) = &config.proxy {
        builder = builder.proxy(proxy.to_reqwest()?);
    }

    builder
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// reqwest-backed [`PageFetcher`]
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: std::time::Duration,
}

impl HttpFetcher {
    /// Create a fetcher honoring the user agent, proxy and timeout settings
    pub fn new(config: &HttpConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(config, true)?,
            timeout: config.request_timeout,
        })
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client, timeout: std::time::Duration) -> Self {
        Self { client, timeout }
    }

    /// The underlying client, shared with the built-in downloader
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!(url = %parsed, "fetching page");

        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        debug!(url = %url, bytes = body.len(), "page fetched");
        Ok(body.to_vec())
    }
}
