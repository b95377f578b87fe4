use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::RegistryError;
use crate::protocol::ToolResult;
use crate::schema::CompiledSchema;

/// Failure raised by a tool handler. The engine turns it into an
/// `isError` tool result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments for tool {tool}: {detail}")]
    InvalidArguments { tool: String, detail: String },
    #[error("Upstream request failed: {0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

/// Advertised shape of a tool, as listed by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

/// A callable exposed to protocol clients.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. `arguments` has already passed the input schema.
    async fn call(&self, arguments: Value) -> Result<ToolResult, ToolError>;
}

/// Deserialize already-validated tool arguments into their typed form.
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        detail: e.to_string(),
    })
}

/// A tool together with its compiled schemas.
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub input_schema: CompiledSchema,
    pub output_schema: Option<CompiledSchema>,
    pub tool: Arc<dyn Tool>,
}

/// Tools keyed by unique name, kept in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let definition = tool.definition();
        if self.get(&definition.name).is_some() {
            return Err(RegistryError::DuplicateTool(definition.name));
        }

        let input_schema = CompiledSchema::compile(definition.input_schema.clone()).map_err(|source| {
            RegistryError::InvalidSchema {
                name: definition.name.clone(),
                source,
            }
        })?;
        let output_schema = definition
            .output_schema
            .clone()
            .map(CompiledSchema::compile)
            .transpose()
            .map_err(|source| RegistryError::InvalidSchema {
                name: definition.name.clone(),
                source,
            })?;

        self.tools.push(RegisteredTool {
            definition,
            input_schema,
            output_schema,
            tool,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.definition.name == name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|t| &t.definition)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
