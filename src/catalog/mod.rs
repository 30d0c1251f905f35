//! Declarative endpoint catalog and dispatch engine
//!
//! Endpoints are described as data (`data/endpoints.json`) and executed as
//! MCP tools without endpoint-specific code.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Endpoint catalog │────▶│ EndpointRegistry│────▶│ RequestBuilder  │
//! │ (endpoints.json) │     │ (name → desc.)  │     │ (path/query/body)│
//! └──────────────────┘     └─────────────────┘     └────────┬────────┘
//!                                                           │
//!                                                           ▼
//!                          ┌─────────────────┐     ┌─────────────────┐
//!                          │  HttpTransport  │◀────│  ApiDispatcher  │
//!                          │ (bearer token)  │     │ (ApiResponse)   │
//!                          └─────────────────┘     └─────────────────┘
//! ```
//!
//! Adding an endpoint means adding a descriptor. The only tool-specific
//! behavior lives in the builder: free-text search translation and the
//! promotion-search campaign filter.

mod builder;
mod builtin;
mod definition;
mod dispatcher;
mod loader;
mod registry;
mod transport;

pub use builder::{
    CAMPAIGN_ARG, PROMOTION_SEARCH_TOOL, QUERY_ARG, RequestBuilder, RequestParams, SITE_ARG,
    search_fields, term_query, text_query,
};
pub use builtin::builtin_endpoints;
pub use definition::*;
pub use dispatcher::{ApiDispatcher, ApiResponse, build_query_string};
pub use loader::{CatalogLoader, validate_catalog, validate_descriptor};
pub use registry::EndpointRegistry;
pub use transport::{HttpTransport, OcapiClient, data_api_base_url};

pub(crate) use builder::present;
