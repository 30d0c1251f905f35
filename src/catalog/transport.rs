//! HTTP transport for the Data API
//!
//! # Security
//!
//! The bearer token is fetched from the [`TokenProvider`] for every request
//! and is never logged or included in error messages.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::{Error, Result};

/// Maximum number of error-body characters kept in transport errors
const MAX_ERROR_BODY: usize = 500;

/// Verb-specific HTTP calls relative to an API base URL
///
/// `path` always includes the query string, if any. Implementations return
/// the parsed JSON payload of a 2xx response and an [`Error::Transport`] for
/// everything else.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a GET request
    async fn get(&self, path: &str) -> Result<Value>;

    /// Send a POST request with a JSON body
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    /// Send a PUT request with a JSON body
    async fn put(&self, path: &str, body: &Value) -> Result<Value>;

    /// Send a PATCH request with a JSON body
    async fn patch(&self, path: &str, body: &Value) -> Result<Value>;

    /// Send a DELETE request
    async fn delete(&self, path: &str) -> Result<Value>;
}

/// `reqwest`-backed Data API client
pub struct OcapiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl OcapiClient {
    /// Create a client for `https://{hostname}/s/-/dw/data/{api_version}`
    pub fn new(hostname: &str, api_version: &str, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ocapi-tools/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(
            client,
            data_api_base_url(hostname, api_version),
            tokens,
        ))
    }

    /// Create a client over an existing `reqwest::Client` and base URL
    #[must_use]
    pub fn with_client(client: Client, base_url: String, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Base URL every request path is appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.tokens.bearer_token().await?;

        let mut request = self.client.request(method.clone(), &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, url = %url, "Sending Data API request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request failed: {e}")))?;

        Self::handle_response(response).await
    }

    /// Parse a response body, turning non-2xx statuses into errors
    async fn handle_response(response: Response) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Transport(format!(
                "API returned {}: {}",
                status,
                error_text.chars().take(MAX_ERROR_BODY).collect::<String>()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response: {e}")))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::Transport(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl HttpTransport for OcapiClient {
    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::DELETE, path, None).await
    }
}

/// Data API base URL for an instance
#[must_use]
pub fn data_api_base_url(hostname: &str, api_version: &str) -> String {
    let host = hostname
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{host}/s/-/dw/data/{api_version}")
}
