//! Real-Debrid link unrestriction
//!
//! Turns a hoster link into a direct, premium download URL through the
//! Real-Debrid REST API. Only the three endpoints the pipeline needs are
//! covered: `unrestrict/link`, `hosts` and `hosts/status`.

use crate::config::{HttpConfig, RealDebridConfig};
use crate::error::{ConfigError, UnrestrictError};
use crate::fetcher::build_client;
use crate::types::{HostInfo, HostStatus, ResolvedDownload};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Links on this domain are already unrestricted
const DEBRID_DOMAIN: &str = "real-debrid.com";

/// Error body returned by the API on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Client for the Real-Debrid REST API
#[derive(Clone)]
pub struct RealDebridClient {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl std::fmt::Debug for RealDebridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealDebridClient")
            .field("api_url", &self.api_url)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl RealDebridClient {
    /// Create a client; the HTTP proxy is used only when `use_proxy` is set
    pub fn new(config: &RealDebridConfig, http: &HttpConfig) -> Result<Self, ConfigError> {
        let client = build_client(http, config.use_proxy)?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: reqwest::Client, config: &RealDebridConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.trim().to_string(),
        }
    }

    /// Whether a token is configured
    pub fn is_enabled(&self) -> bool {
        !self.api_token.is_empty()
    }

    /// Unrestrict a hoster link into a direct download URL
    ///
    /// # Errors
    ///
    /// [`UnrestrictError::MissingToken`] when no token is configured, and
    /// [`UnrestrictError::ApiError`] for transport failures, non-2xx
    /// responses, API error bodies and responses without a `download` field.
    pub async fn unrestrict(&self, link: &str) -> Result<String, UnrestrictError> {
        if !self.is_enabled() {
            return Err(UnrestrictError::MissingToken);
        }

        let endpoint = format!("{}/unrestrict/link", self.api_url);
        debug!(link = %link, "unrestricting link");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .form(&[("link", link)])
            .send()
            .await
            .map_err(|e| UnrestrictError::ApiError(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UnrestrictError::ApiError(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = api_error_message(&body)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(link = %link, status = status.as_u16(), error = %message, "unrestrict rejected");
            return Err(UnrestrictError::ApiError(message));
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| UnrestrictError::ApiError(format!("invalid JSON response: {e}")))?;

        match value.get("download").and_then(|d| d.as_str()) {
            Some(download) if !download.trim().is_empty() => {
                info!(link = %link, "link unrestricted");
                Ok(download.trim().to_string())
            }
            _ => Err(UnrestrictError::ApiError(
                api_error_message(&body)
                    .unwrap_or_else(|| "response has no download link".to_string()),
            )),
        }
    }

    /// Unrestrict `link` when a token is configured
    ///
    /// Without a token, or for links already on the debrid domain, the link
    /// passes through unchanged and no request is made.
    pub async fn prepare(&self, link: &str) -> Result<ResolvedDownload, UnrestrictError> {
        if !self.is_enabled() || link.contains(DEBRID_DOMAIN) {
            return Ok(ResolvedDownload::passthrough(link));
        }
        let final_url = self.unrestrict(link).await?;
        Ok(ResolvedDownload {
            original_url: link.to_string(),
            final_url,
        })
    }

    /// Hosters the service can unrestrict, keyed by domain
    pub async fn supported_hosts(&self) -> Result<HashMap<String, HostInfo>, UnrestrictError> {
        self.get_json("hosts").await
    }

    /// Current up/down status of each supported hoster, keyed by domain
    pub async fn host_status(&self) -> Result<HashMap<String, HostStatus>, UnrestrictError> {
        self.get_json("hosts/status").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UnrestrictError> {
        let endpoint = format!("{}/{}", self.api_url, path);
        debug!(url = %endpoint, "querying debrid API");

        let mut request = self.client.get(&endpoint);
        if self.is_enabled() {
            request = request.bearer_auth(&self.api_token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UnrestrictError::ApiError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UnrestrictError::ApiError(
                api_error_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UnrestrictError::ApiError(format!("invalid JSON response: {e}")))
    }
}

fn api_error_message(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    Some(match parsed.error_code {
        Some(code) => format!("{} (code {})", parsed.error, code),
        None => parsed.error,
    })
}
