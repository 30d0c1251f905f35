//! MCP server - JSON-RPC handlers over the tool router
//!
//! Handles `initialize`, `ping`, `tools/list` and `tools/call`. The tool
//! family is only advertised when the Data API capability is present; the
//! router itself still fails closed for direct calls.

mod stdio;

pub use stdio::{serve, serve_stdio};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::capability::CapabilitySet;
use crate::error::rpc_codes;
use crate::protocol::{
    Info, InitializeResult, JsonRpcMessage, JsonRpcResponse, RequestId, ServerCapabilities,
    ToolsCallParams, ToolsCapability, ToolsListResult, negotiate_version,
};
use crate::router::ToolRouter;

/// Server-side MCP message handling
pub struct McpServer {
    router: Arc<ToolRouter>,
    capabilities: CapabilitySet,
}

impl McpServer {
    /// Create a server over a router
    #[must_use]
    pub fn new(router: Arc<ToolRouter>, capabilities: CapabilitySet) -> Self {
        Self {
            router,
            capabilities,
        }
    }

    /// Handle one raw JSON-RPC line
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: JsonRpcMessage = match serde_json::from_str(line) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Malformed JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        match message {
            JsonRpcMessage::Notification(n) => {
                debug!(method = %n.method, "Notification received");
                None
            }
            JsonRpcMessage::Request(request) => Some(
                self.handle_request(request.id, &request.method, request.params)
                    .await,
            ),
        }
    }

    /// Dispatch a request by method name
    pub async fn handle_request(
        &self,
        id: RequestId,
        method: &str,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        match method {
            "initialize" => Self::handle_initialize(id, params.as_ref()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params).await,
            _ => JsonRpcResponse::error(
                Some(id),
                rpc_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        }
    }

    /// Handle initialize request with version negotiation
    pub fn handle_initialize(id: RequestId, params: Option<&Value>) -> JsonRpcResponse {
        let client_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let negotiated = negotiate_version(client_version);
        debug!(
            client = client_version,
            negotiated, "Protocol version negotiation"
        );

        let result = InitializeResult {
            protocol_version: negotiated.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: Info {
                name: "ocapi-tools".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("OCAPI Tools".to_string()),
                description: Some(
                    "Commerce OCAPI endpoints exposed as MCP tools".to_string(),
                ),
            },
            instructions: None,
        };
        to_response(id, &result)
    }

    /// Handle tools/list request
    pub fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let tools = if self.capabilities.data_api {
            self.router.tools()
        } else {
            Vec::new()
        };
        to_response(
            id,
            &ToolsListResult {
                tools,
                next_cursor: None,
            },
        )
    }

    /// Handle tools/call request
    pub async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let started = Instant::now();

        let params: ToolsCallParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(p)) => p,
            Ok(None) => {
                return JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INVALID_PARAMS,
                    "Missing tools/call params",
                );
            }
            Err(e) => {
                return JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INVALID_PARAMS,
                    format!("Invalid tools/call params: {e}"),
                );
            }
        };

        if !self.router.can_handle(&params.name) {
            return JsonRpcResponse::error(
                Some(id),
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", params.name),
            );
        }

        let arguments = if params.arguments.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            params.arguments
        };
        let result = self.router.handle(&params.name, arguments, started).await;
        to_response(id, &result)
    }
}

fn to_response(id: RequestId, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(Some(id), rpc_codes::INTERNAL_ERROR, e.to_string()),
    }
}
