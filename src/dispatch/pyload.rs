//! pyLoad HTTP API client
//!
//! pyLoad's API takes form fields whose values are JSON-encoded and returns
//! JSON. A call needs a session token obtained from `api/login`.

use crate::config::PyloadConfig;
use crate::error::DispatchError;
use crate::utils::ensure_scheme;
use serde_json::Value;
use tracing::{debug, info};

/// Session-based pyLoad API client
#[derive(Clone, Debug)]
pub struct PyloadClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl PyloadClient {
    /// Create a client for the instance described by `config`
    pub fn new(client: reqwest::Client, config: &PyloadConfig) -> Self {
        Self {
            client,
            base_url: ensure_scheme(config.host.trim())
                .trim_end_matches('/')
                .to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Log in and return the session token
    pub async fn login(&self) -> Result<String, DispatchError> {
        let url = format!("{}/api/login", self.base_url);
        debug!(url = %url, "logging in to pyLoad");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DispatchError::ApiRejected(format!("login request failed: {e}")))?;

        match parse_response(response).await? {
            Value::String(session) if !session.is_empty() => Ok(session),
            other => Err(DispatchError::ApiRejected(format!(
                "login refused (response: {other})"
            ))),
        }
    }

    /// Call an API method with a session; argument values are JSON-encoded
    pub async fn call(
        &self,
        session: &str,
        method: &str,
        args: &[(&str, Value)],
    ) -> Result<Value, DispatchError> {
        let url = format!("{}/api/{}", self.base_url, method);
        let mut form: Vec<(String, String)> = args
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        form.push(("session".to_string(), session.to_string()));

        debug!(url = %url, "calling pyLoad API");
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| DispatchError::ApiRejected(format!("{method} request failed: {e}")))?;

        parse_response(response).await
    }

    /// Log in and add `links` as one package, returning the package id
    pub async fn add_package(&self, name: &str, links: &[&str]) -> Result<Value, DispatchError> {
        let session = self.login().await?;
        let package = self
            .call(
                &session,
                "addPackage",
                &[
                    ("name", Value::from(name)),
                    ("links", Value::from(links.to_vec())),
                ],
            )
            .await?;

        info!(package = %package, "pyLoad accepted package");
        Ok(package)
    }
}

async fn parse_response(response: reqwest::Response) -> Result<Value, DispatchError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DispatchError::ApiRejected(format!("failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(DispatchError::ApiRejected(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| DispatchError::ApiRejected(format!("invalid JSON response: {e}")))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PyloadClient {
        PyloadClient::new(
            reqwest::Client::new(),
            &PyloadConfig {
                host: server.uri(),
                username: "admin".to_string(),
                password: "pw".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn add_package_logs_in_then_sends_json_encoded_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_string_contains("username=admin"))
            .and(body_string_contains("password=pw"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\"sess42\""))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/addPackage"))
            .and(body_string_contains("session=sess42"))
            .and(body_string_contains("name=%22TVLinker%22"))
            .and(body_string_contains(
                "links=%5B%22https%3A%2F%2Fdl.example%2Ff.mkv%22%5D",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("7"))
            .expect(1)
            .mount(&server)
            .await;

        let package = client(&server)
            .add_package("TVLinker", &["https://dl.example/f.mkv"])
            .await
            .unwrap();
        assert_eq!(package, Value::from(7));
    }

    #[tokio::test]
    async fn false_login_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("false"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/addPackage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .add_package("TVLinker", &["https://dl.example/f.mkv"])
            .await
            .unwrap_err();
        let DispatchError::ApiRejected(msg) = err else {
            panic!("expected an API rejection");
        };
        assert!(msg.contains("login refused"));
    }

    #[tokio::test]
    async fn server_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server).login().await.unwrap_err();
        assert_eq!(err, DispatchError::ApiRejected("HTTP 500: boom".into()));
    }
}
