//! JSON-RPC dispatch for MCP requests.
//!
//! Transports depend only on [`ProtocolEngine`]; [`McpServer`] is the
//! registry-backed implementation used by the binary.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ReadResourceParams,
    ReadResourceResult, ResourceContents, RpcId, ToolCallParams, ToolResult,
};
use crate::registry::{
    RegistryError, ResourceDescriptor, ResourceError, ResourceRegistry, Tool, ToolRegistry,
};

/// Protocol revisions this server can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] =
    &["2025-06-18", "2025-03-26", "2024-11-05", "2024-10-07"];

pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Which transport binding delivered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Streamable,
    Sse,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streamable => f.write_str("streamable"),
            Self::Sse => f.write_str("sse"),
        }
    }
}

/// Per-request facts the transport hands to the engine.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub transport: TransportKind,
    /// Identifier of the transport instance that decoded the request.
    pub transport_id: String,
    /// Set only for the event-stream binding.
    pub session_id: Option<String>,
}

/// The capability surface every transport is written against.
#[async_trait]
pub trait ProtocolEngine: Send + Sync + 'static {
    fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError>;

    fn register_resource(&mut self, resource: ResourceDescriptor) -> Result<(), RegistryError>;

    /// Handle one decoded request. Returns `None` for notifications.
    async fn handle(&self, ctx: &RequestContext, request: JsonRpcRequest) -> Option<JsonRpcResponse>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Registry-backed MCP engine.
pub struct McpServer {
    info: ServerInfo,
    tools: ToolRegistry,
    resources: ResourceRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
        }
    }

    async fn dispatch(&self, req: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        match req.method.as_str() {
            "initialize" => {
                let params: InitializeParams = parse_params(&req.params, "initialize")?;
                if let Some(client) = &params.client_info {
                    tracing::info!(
                        client = client.name.as_deref().unwrap_or("unknown"),
                        client_version = client.version.as_deref().unwrap_or("unknown"),
                        "client initializing"
                    );
                }
                let requested = params.protocol_version.unwrap_or_default();
                let version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested.as_str()) {
                    requested
                } else {
                    LATEST_PROTOCOL_VERSION.to_string()
                };
                Ok(json!({
                    "protocolVersion": version,
                    "capabilities": {
                        "tools": { "listChanged": false },
                        "resources": { "listChanged": false }
                    },
                    "serverInfo": self.info
                }))
            }

            "ping" => Ok(json!({})),

            "tools/list" => {
                let tools: Vec<_> = self.tools.definitions().collect();
                Ok(json!({ "tools": tools }))
            }

            "tools/call" => {
                let params: ToolCallParams = parse_params(&req.params, "tools/call")?;
                let result = self.call_tool(params).await;
                serde_json::to_value(&result)
                    .map_err(|e| JsonRpcError::internal_error(format!("Cannot serialize tool result: {e}")))
            }

            // Templates are not enumerable, so there is nothing concrete to list.
            "resources/list" => Ok(json!({ "resources": [] })),

            "resources/templates/list" => {
                let templates: Vec<_> = self.resources.templates().map(|r| r.definition()).collect();
                Ok(json!({ "resourceTemplates": templates }))
            }

            "resources/read" => {
                let params: ReadResourceParams = parse_params(&req.params, "resources/read")?;
                let contents = self.read_resource(&params.uri).await?;
                serde_json::to_value(ReadResourceResult {
                    contents: vec![contents],
                })
                .map_err(|e| JsonRpcError::internal_error(format!("Cannot serialize resource: {e}")))
            }

            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    async fn call_tool(&self, params: ToolCallParams) -> ToolResult {
        let Some(entry) = self.tools.get(&params.name) else {
            return ToolResult::error(format!("Tool {} not found", params.name));
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        if let Err(e) = entry.input_schema.validate(&arguments) {
            return ToolResult::error(format!(
                "Input validation error: Invalid arguments for tool {}: {e}",
                params.name
            ));
        }

        let result = match entry.tool.call(arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tool call failed");
                return ToolResult::error(e.to_string());
            }
        };

        if let (Some(schema), false) = (&entry.output_schema, result.is_error) {
            let Some(structured) = &result.structured_content else {
                return ToolResult::error(format!(
                    "Output validation error: Tool {} has an output schema but no structured content was provided",
                    params.name
                ));
            };
            if let Err(e) = schema.validate(structured) {
                tracing::error!(tool = %params.name, error = %e, "tool output violates its schema");
                return ToolResult::error(format!(
                    "Output validation error: Invalid structured content for tool {}: {e}",
                    params.name
                ));
            }
        }

        result
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, JsonRpcError> {
        let (descriptor, vars) = self
            .resources
            .resolve(uri)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Resource {uri} not found")))?;

        let text = descriptor.handler.read(uri, &vars).await.map_err(|e| match e {
            ResourceError::MissingParameter(_) => JsonRpcError::invalid_params(e.to_string()),
        })?;

        Ok(ResourceContents {
            uri: uri.to_string(),
            text,
        })
    }
}

#[async_trait]
impl ProtocolEngine for McpServer {
    fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        self.tools.register(tool)
    }

    fn register_resource(&mut self, resource: ResourceDescriptor) -> Result<(), RegistryError> {
        self.resources.register(resource)
    }

    async fn handle(&self, ctx: &RequestContext, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if req.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(req.id, JsonRpcError::invalid_request()));
        }

        tracing::debug!(
            method = %req.method,
            transport = %ctx.transport,
            transport_id = %ctx.transport_id,
            session_id = ctx.session_id.as_deref().unwrap_or("-"),
            "dispatching request"
        );

        // Notifications never get a response, including ones we don't know.
        if req.is_notification() {
            return None;
        }

        let id: Option<RpcId> = req.id.clone();
        Some(match self.dispatch(&req).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }
}

fn parse_params<T: DeserializeOwned>(params: &Option<Value>, method: &str) -> Result<T, JsonRpcError> {
    let value = params.clone().unwrap_or_else(|| json!({}));
    serde_json::from_value(value)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {method} params: {e}")))
}
