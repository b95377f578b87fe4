pub mod resources;
pub mod tools;

pub use resources::{
    ResourceDescriptor, ResourceError, ResourceHandler, ResourceRegistry,
    ResourceTemplateDefinition, UriTemplate,
};
pub use tools::{parse_arguments, Tool, ToolDefinition, ToolError, ToolRegistry};

use crate::schema::SchemaValidationError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
    #[error("Resource already registered: {0}")]
    DuplicateResource(String),
    #[error("Invalid schema for tool {name}: {source}")]
    InvalidSchema {
        name: String,
        #[source]
        source: SchemaValidationError,
    },
    #[error("Invalid URI template: {0}")]
    InvalidTemplate(String),
    #[error("Template {template} exposes {expected:?} but handler consumes {declared:?}")]
    ParameterMismatch {
        template: String,
        expected: Vec<String>,
        declared: Vec<String>,
    },
}
