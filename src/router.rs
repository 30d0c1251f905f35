//! Tool router - capability-gated front door for Data API tools
//!
//! The router owns every `data`-family tool of the registry. Per-tool
//! behavior is a table of [`ToolOperation`] records built once from the
//! descriptors; `handle` never branches on tool names.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::capability::CapabilitySet;
use crate::catalog::{
    ApiDispatcher, DATA_FAMILY, EndpointDescriptor, EndpointRegistry, QUERY_ARG, RequestBuilder,
    SITE_ARG, present,
};
use crate::protocol::{Content, Tool, ToolsCallResult};
use crate::{Error, Result};

/// Shown when the capability gate kept the dispatcher closed
const NOT_INITIALIZED_HINT: &str =
    "Configure hostname, client id and client secret to enable Data API tools.";

/// Builds the debug line logged for each call
pub type LogMessageFn = fn(&str, &Value) -> String;

/// Per-tool record of the operation table
#[derive(Debug, Clone)]
pub struct ToolOperation {
    /// Arguments checked before anything is built, in declaration order
    pub required_args: Vec<String>,
    /// `{site_id}` is a path placeholder the site selector can fill
    pub site_in_path: bool,
    /// Debug log line builder
    pub log_message: LogMessageFn,
}

impl ToolOperation {
    fn from_descriptor(descriptor: &EndpointDescriptor) -> Self {
        Self {
            required_args: descriptor.required_params().map(str::to_string).collect(),
            site_in_path: descriptor.is_path_param(SITE_ARG),
            log_message: log_message_for(&descriptor.tool_name),
        }
    }

    /// First required argument that is absent, null or empty
    ///
    /// With `site_selected`, a missing `site_id` path argument is not
    /// reported: the dispatcher fills it from the selector.
    #[must_use]
    pub fn missing_arg(&self, args: &Value, site_selected: bool) -> Option<&str> {
        self.required_args
            .iter()
            .filter(|name| !(site_selected && self.site_in_path && *name == SITE_ARG))
            .find(|name| present(args, name).is_none())
            .map(String::as_str)
    }
}

/// Log builders by tool-name prefix
const LOG_BUILDERS: &[(&str, LogMessageFn)] = &[
    ("search_", log_search),
    ("get_", log_fetch),
    ("create_", log_mutation),
    ("update_", log_mutation),
    ("delete_", log_mutation),
];

fn log_message_for(tool_name: &str) -> LogMessageFn {
    LOG_BUILDERS
        .iter()
        .find(|(prefix, _)| tool_name.starts_with(prefix))
        .map_or(log_generic as LogMessageFn, |(_, builder)| *builder)
}

fn log_search(tool: &str, args: &Value) -> String {
    match present(args, QUERY_ARG).and_then(Value::as_str) {
        Some(phrase) => format!("{tool}: searching for \"{phrase}\""),
        None => format!("{tool}: listing all matches"),
    }
}

fn log_fetch(tool: &str, args: &Value) -> String {
    format!("{tool}: fetching{}", identifiers(args))
}

fn log_mutation(tool: &str, args: &Value) -> String {
    format!("{tool}: modifying{}", identifiers(args))
}

fn log_generic(tool: &str, _args: &Value) -> String {
    format!("{tool}: invoking")
}

/// ` key=value` pairs for identifier-looking arguments
fn identifiers(args: &Value) -> String {
    let Some(map) = args.as_object() else {
        return String::new();
    };
    map.iter()
        .filter(|(key, _)| key.ends_with("_id") || key.ends_with("_no"))
        .filter_map(|(key, value)| value.as_str().map(|v| format!(" {key}={v}")))
        .collect()
}

/// Capability-gated router for Data API tools
pub struct ToolRouter {
    registry: Arc<EndpointRegistry>,
    builder: RequestBuilder,
    operations: HashMap<String, ToolOperation>,
    dispatcher: RwLock<Option<Arc<ApiDispatcher>>>,
}

impl ToolRouter {
    /// Create a router owning the registry's Data API tools
    ///
    /// The router starts closed; call [`ToolRouter::initialize`] to attach
    /// a dispatcher.
    #[must_use]
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        let operations = registry
            .filter_by_family(DATA_FAMILY)
            .iter()
            .map(|d| (d.tool_name.clone(), ToolOperation::from_descriptor(d)))
            .collect();

        Self {
            registry,
            builder: RequestBuilder::new(),
            operations,
            dispatcher: RwLock::new(None),
        }
    }

    /// Attach a dispatcher if the Data API capability is present
    ///
    /// With the capability missing, or if the dispatcher cannot be created,
    /// the router stays closed and every call fails with a
    /// "not initialized" error.
    pub fn initialize<F>(&self, capabilities: &CapabilitySet, make_dispatcher: F)
    where
        F: FnOnce() -> Result<Arc<ApiDispatcher>>,
    {
        if !capabilities.data_api {
            warn!("Data API credentials not configured; Data API tools are disabled");
            return;
        }

        match make_dispatcher() {
            Ok(dispatcher) => {
                *self.dispatcher.write() = Some(dispatcher);
                info!(tools = self.operations.len(), "Data API tools enabled");
            }
            Err(e) => {
                warn!(error = %e, "Failed to create Data API dispatcher; Data API tools are disabled");
            }
        }
    }

    /// Check if this router owns `name`
    #[must_use]
    pub fn can_handle(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Check if a dispatcher is attached
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.dispatcher.read().is_some()
    }

    /// Operation record for an owned tool
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&ToolOperation> {
        self.operations.get(name)
    }

    /// MCP tool definitions for the owned tools, in catalog order
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.registry
            .filter_by_family(DATA_FAMILY)
            .iter()
            .filter(|d| self.can_handle(&d.tool_name))
            .map(|d| d.to_mcp_tool())
            .collect()
    }

    /// Handle one tool call
    ///
    /// Never fails: every error is rendered as an `isError` result.
    /// `started` is when the host received the call; elapsed time is logged.
    pub async fn handle(&self, name: &str, args: Value, started: Instant) -> ToolsCallResult {
        debug!(tool = %name, "{}", self.call_log_line(name, &args));

        let outcome = self.run(name, &args).await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            tool = %name,
            elapsed_ms,
            is_error = outcome.is_err(),
            "Tool call finished"
        );

        match outcome {
            Ok(data) => success_result(&data),
            Err(e) => error_result(&e.to_string()),
        }
    }

    /// Debug line for a call, generic for tools this router does not own
    fn call_log_line(&self, name: &str, args: &Value) -> String {
        let log_message = self
            .operations
            .get(name)
            .map_or(log_generic as LogMessageFn, |op| op.log_message);
        log_message(name, args)
    }

    async fn run(&self, name: &str, args: &Value) -> Result<Value> {
        let dispatcher = self
            .dispatcher
            .read()
            .clone()
            .ok_or_else(|| Error::ClientNotInitialized(NOT_INITIALIZED_HINT.to_string()))?;

        let site_selected = dispatcher.site_id().is_some();
        if let Some(field) = self
            .operations
            .get(name)
            .and_then(|op| op.missing_arg(args, site_selected))
        {
            return Err(Error::Validation(format!("Missing required parameter: {field}")));
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownEndpoint(name.to_string()))?;
        let params = self.builder.build(&descriptor, args)?;

        let response = dispatcher.execute(name, &params).await;
        if response.success {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(Error::Transport(
                response
                    .error
                    .unwrap_or_else(|| format!("Request failed with status {}", response.status)),
            ))
        }
    }

    /// Release the dispatcher; safe to call repeatedly
    pub fn dispose(&self) {
        if self.dispatcher.write().take().is_some() {
            debug!("Data API dispatcher released");
        }
    }
}

/// Tool result carrying `data` as pretty-printed JSON
fn success_result(data: &Value) -> ToolsCallResult {
    let text = match data {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    ToolsCallResult {
        content: vec![Content::Text {
            text,
        }],
        is_error: false,
    }
}

/// Tool error result with a human-readable message
fn error_result(message: &str) -> ToolsCallResult {
    ToolsCallResult {
        content: vec![Content::Text {
            text: message.to_string(),
        }],
        is_error: true,
    }
}
