//! aria2 JSON-RPC client

use crate::config::Aria2Config;
use crate::error::DispatchError;
use crate::utils::ensure_scheme;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Adds downloads to an aria2 daemon over JSON-RPC
#[derive(Clone, Debug)]
pub struct Aria2Client {
    client: reqwest::Client,
    endpoint: String,
    credential: Option<String>,
}

impl Aria2Client {
    /// Create a client for the daemon described by `config`
    pub fn new(client: reqwest::Client, config: &Aria2Config) -> Self {
        let host = ensure_scheme(config.host.trim()).trim_end_matches('/').to_string();
        Self {
            client,
            endpoint: format!("{}:{}/jsonrpc", host, config.port),
            credential: credential(config),
        }
    }

    /// The RPC endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// JSON-RPC request body adding `link`
    pub fn add_uri_payload(&self, link: &str) -> Value {
        let mut params = Vec::with_capacity(2);
        if let Some(credential) = &self.credential {
            params.push(json!(credential));
        }
        params.push(json!([link]));

        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "aria2.addUri",
            "params": params,
        })
    }

    /// Add `link` and return the download's GID
    ///
    /// # Errors
    ///
    /// [`DispatchError::RpcRejected`] when the daemon is unreachable, answers
    /// with something other than JSON, or the response has no `result`.
    pub async fn add_uri(&self, link: &str) -> Result<String, DispatchError> {
        debug!(endpoint = %self.endpoint, link = %link, "calling aria2.addUri");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.add_uri_payload(link))
            .send()
            .await
            .map_err(|e| DispatchError::RpcRejected(format!("request failed: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| DispatchError::RpcRejected(format!("invalid JSON response: {e}")))?;

        match body.get("result") {
            Some(result) => {
                let gid = result
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| result.to_string());
                info!(gid = %gid, "aria2 accepted download");
                Ok(gid)
            }
            None => {
                let message = body
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string());
                Err(DispatchError::RpcRejected(message))
            }
        }
    }
}

/// User/password takes precedence over the secret token
fn credential(config: &Aria2Config) -> Option<String> {
    if !config.username.is_empty() && !config.password.is_empty() {
        Some(format!("{}:{}", config.username, config.password))
    } else if !config.secret.is_empty() {
        Some(format!("token:{}", config.secret))
    } else {
        None
    }
}
