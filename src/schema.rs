use jsonschema::{validator_for, Validator};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("{0}")]
    ValidationFailed(String),
}

/// A JSON Schema compiled once and reused for every instance it checks.
pub struct CompiledSchema {
    raw: Value,
    validator: Validator,
}

impl CompiledSchema {
    pub fn compile(schema: Value) -> Result<Self, SchemaValidationError> {
        let validator = validator_for(&schema)
            .map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;
        Ok(Self {
            raw: schema,
            validator,
        })
    }

    /// The schema document as it is advertised to clients.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Validate an instance, joining every violation into one message.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed(violations.join("; ")))
        }
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema").field("raw", &self.raw).finish()
    }
}

/// Validate a JSON instance against a JSON Schema (draft 2020-12).
/// Returns Ok(()) if valid, Err otherwise.
pub fn validate_json(schema_str: &str, instance_str: &str) -> Result<(), SchemaValidationError> {
    let schema_json: Value = serde_json::from_str(schema_str)?;
    let instance_json: Value = serde_json::from_str(instance_str)?;

    CompiledSchema::compile(schema_json)?.validate(&instance_json)
}
