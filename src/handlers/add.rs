use async_trait::async_trait;
use serde_json::{json, Number, Value};

use crate::protocol::{AddParams, ToolResult};
use crate::registry::{parse_arguments, Tool, ToolDefinition, ToolError};

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

/// Render a number the way a JSON client expects: integral values without a
/// fractional part, so `3.0` serializes as `3`.
pub fn json_number(value: f64) -> Option<Value> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number)
}

/// `add`: sums two numbers.
pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "add".into(),
            title: Some("Addition Tool".into()),
            description: Some("Add two numbers".into()),
            input_schema: json!({
                "type": "object",
                "required": ["a", "b"],
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                }
            }),
            output_schema: Some(json!({
                "type": "object",
                "required": ["result"],
                "properties": {
                    "result": { "type": "number" }
                }
            })),
        }
    }

    async fn call(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let params: AddParams = parse_arguments("add", arguments)?;
        let sum = add(params.a, params.b);
        let result = json_number(sum).ok_or_else(|| {
            ToolError::Internal(format!("Sum of {} and {} is not a finite number", params.a, params.b))
        })?;

        let output = json!({ "result": result });
        Ok(ToolResult::structured(output.to_string(), output))
    }
}
