//! API dispatcher - one authenticated call per tool invocation
//!
//! The dispatcher resolves the descriptor, renders the URL, routes to the
//! verb-specific transport call and normalizes the outcome into an
//! [`ApiResponse`]. It never returns an error: every failure becomes a
//! `success: false` envelope.
//!
//! Known simplifications:
//! - a successful call is always reported with status 200, whatever the
//!   transport actually received;
//! - a `{placeholder}` with no value is left verbatim in the URL (logged as
//!   a warning).
//!
//! The site selector is instance-global: concurrent calls that set
//! different sites through the same dispatcher race with each other.
//! Callers that need isolation pass `site_id` explicitly per call.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::builder::scalar_to_string;
use super::{EndpointRegistry, HttpMethod, HttpTransport, RequestParams, SITE_ARG};
use crate::Error;

/// Normalized outcome of one dispatched call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the call succeeded
    pub success: bool,
    /// Envelope status (200 on success, 400/500 on failure)
    pub status: u16,
    /// Response payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Successful call carrying `data`
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            status: 200,
            data: Some(data),
            error: None,
        }
    }

    /// Failed call with the error's envelope status
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        Self {
            success: false,
            status: error.status_code(),
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Dispatcher turning descriptors and parameters into HTTP calls
pub struct ApiDispatcher {
    registry: Arc<EndpointRegistry>,
    transport: Arc<dyn HttpTransport>,
    site_id: RwLock<Option<String>>,
}

impl ApiDispatcher {
    /// Create a dispatcher over a registry and transport
    pub fn new(registry: Arc<EndpointRegistry>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry,
            transport,
            site_id: RwLock::new(None),
        }
    }

    /// Execute the endpoint registered under `tool_name`
    pub async fn execute(&self, tool_name: &str, params: &RequestParams) -> ApiResponse {
        let Some(descriptor) = self.registry.get(tool_name) else {
            return ApiResponse::from_error(&Error::UnknownEndpoint(tool_name.to_string()));
        };

        let method = match descriptor.http_method() {
            Ok(method) => method,
            Err(e) => return ApiResponse::from_error(&e),
        };

        let path = self.build_path(&descriptor.path, params);
        let url = format!("{path}{}", build_query_string(&params.query_params));
        debug!(tool = %tool_name, method = %method, url = %url, "Dispatching endpoint");

        let body = || Value::Object(params.body.clone().unwrap_or_default());
        let result = match method {
            HttpMethod::Get => self.transport.get(&url).await,
            HttpMethod::Post => self.transport.post(&url, &body()).await,
            HttpMethod::Put => self.transport.put(&url, &body()).await,
            HttpMethod::Patch => self.transport.patch(&url, &body()).await,
            HttpMethod::Delete => self.transport.delete(&url).await,
        };

        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(e) => {
                debug!(tool = %tool_name, error = %e, "Endpoint call failed");
                ApiResponse {
                    success: false,
                    status: 500,
                    data: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Substitute percent-encoded path parameters into a template
    fn build_path(&self, template: &str, params: &RequestParams) -> String {
        let mut path = template.to_string();

        for (name, value) in &params.path_params {
            let placeholder = format!("{{{name}}}");
            path = path.replace(&placeholder, &urlencoding::encode(value));
        }

        let site_placeholder = format!("{{{SITE_ARG}}}");
        if path.contains(&site_placeholder) {
            if let Some(site) = self.site_id() {
                path = path.replace(&site_placeholder, &urlencoding::encode(&site));
            }
        }

        if path.contains('{') {
            warn!(path = %path, "Unresolved path placeholder left in URL");
        }

        path
    }

    /// Current site selector
    #[must_use]
    pub fn site_id(&self) -> Option<String> {
        self.site_id.read().clone()
    }

    /// Replace the site selector for all subsequent calls on this instance
    pub fn set_site_id(&self, site_id: Option<String>) {
        *self.site_id.write() = site_id;
    }

    /// Tool names the registry can dispatch
    #[must_use]
    pub fn available_endpoints(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Check if a tool name can be dispatched
    #[must_use]
    pub fn has_endpoint(&self, tool_name: &str) -> bool {
        self.registry.has_endpoint(tool_name)
    }
}

/// Render query parameters in insertion order, skipping null and empty values
#[must_use]
pub fn build_query_string(query_params: &[(String, Value)]) -> String {
    let pairs: Vec<String> = query_params
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                other => scalar_to_string(other),
            };
            if rendered.is_empty() {
                return None;
            }
            Some(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&rendered)
            ))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
