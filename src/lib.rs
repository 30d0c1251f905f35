//! OCAPI Tools Library
//!
//! Exposes a commerce platform's OCAPI Data API as MCP tools. Endpoints are
//! described declaratively in a catalog file; a single dispatch engine turns
//! each tool call into one authenticated HTTP request.
//!
//! # Features
//!
//! - **Declarative catalog**: JSON or YAML endpoint descriptors, no per-endpoint code
//! - **Search translation**: free-text `query` arguments become text queries
//! - **Capability gating**: Data API tools only run with credentials configured
//! - **Stdio transport**: MCP JSON-RPC over stdin/stdout, logs on stderr

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod capability;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod protocol;
pub mod router;
pub mod server;

pub use error::{Error, Result};

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::{ClientCredentialsProvider, StaticTokenProvider, TokenProvider};
use crate::capability::{CapabilitySet, derive_capabilities};
use crate::catalog::{ApiDispatcher, EndpointRegistry, OcapiClient};
use crate::config::Config;
use crate::router::ToolRouter;

/// Setup tracing/logging
///
/// Output goes to stderr; stdout carries the MCP protocol.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

/// Wired application components
pub struct App {
    /// Endpoint registry shared by router and dispatcher
    pub registry: Arc<EndpointRegistry>,
    /// Capability-gated tool router
    pub router: Arc<ToolRouter>,
    /// Capabilities derived from the configured credentials
    pub capabilities: CapabilitySet,
}

impl App {
    /// Build the registry, router and (when permitted) the dispatcher
    ///
    /// Never fails on missing credentials: the router simply stays closed.
    pub async fn build(config: &Config) -> Self {
        let registry = Arc::new(EndpointRegistry::load(&config.catalog.path).await);
        let capabilities = derive_capabilities(&config.credentials);
        info!(
            endpoints = registry.len(),
            data_api = capabilities.data_api,
            log_access = capabilities.log_access,
            local_mode = capabilities.local_mode,
            "Capabilities resolved"
        );

        let router = Arc::new(ToolRouter::new(Arc::clone(&registry)));
        router.initialize(&capabilities, || make_dispatcher(config, &registry));

        Self {
            registry,
            router,
            capabilities,
        }
    }
}

/// Create the authenticated dispatcher for the configured instance
fn make_dispatcher(config: &Config, registry: &Arc<EndpointRegistry>) -> Result<Arc<ApiDispatcher>> {
    let credentials = &config.credentials;
    let hostname = credentials
        .hostname()
        .ok_or_else(|| Error::Config("hostname is not configured".to_string()))?;

    let tokens: Arc<dyn TokenProvider> = match config.api.access_token.as_deref() {
        Some(token) if !token.trim().is_empty() => Arc::new(StaticTokenProvider::new(token)),
        _ => {
            let (Some(client_id), Some(client_secret)) =
                (credentials.client_id(), credentials.client_secret())
            else {
                return Err(Error::Config(
                    "client id and client secret are not configured".to_string(),
                ));
            };
            Arc::new(ClientCredentialsProvider::new(
                reqwest::Client::new(),
                config.api.oauth_url.clone(),
                client_id,
                client_secret,
            ))
        }
    };

    let client = OcapiClient::new(hostname, &config.api.version, tokens)?;
    let dispatcher = ApiDispatcher::new(Arc::clone(registry), Arc::new(client));
    dispatcher.set_site_id(credentials.site_id().map(str::to_string));
    Ok(Arc::new(dispatcher))
}
