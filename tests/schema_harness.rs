use serde_json::json;

use mcp_demo_server::schema::{validate_json, CompiledSchema, SchemaValidationError};

#[test]
fn json_schema_harness_validates_instance() {
    let schema = r#"{
      "$schema": "https://json-schema.org/draft/2020-12/schema",
      "type": "object",
      "required": ["result"],
      "properties": {
        "result": { "type": "number" }
      }
    }"#;

    validate_json(schema, r#"{ "result": 3 }"#).expect("schema validation failed");
}

#[test]
fn json_schema_harness_reports_violations() {
    let schema = r#"{
      "type": "object",
      "required": ["city"],
      "properties": { "city": { "type": "string" } }
    }"#;

    let err = validate_json(schema, r#"{ "city": 42 }"#).unwrap_err();
    assert!(matches!(err, SchemaValidationError::ValidationFailed(_)));
}

#[test]
fn compiled_schema_is_reusable() {
    let schema = CompiledSchema::compile(json!({
        "type": "object",
        "required": ["a", "b"],
        "properties": {
            "a": { "type": "number" },
            "b": { "type": "number" }
        }
    }))
    .unwrap();

    assert!(schema.validate(&json!({ "a": 1, "b": 2.5 })).is_ok());
    assert!(schema.validate(&json!({ "a": 1 })).is_err());
    assert!(schema.validate(&json!({ "a": 1, "b": "2" })).is_err());
    assert_eq!(schema.as_value()["required"], json!(["a", "b"]));
}

#[test]
fn unparsable_schema_is_reported() {
    let err = validate_json("{", "{}").unwrap_err();
    assert!(matches!(err, SchemaValidationError::SchemaParse(_)));
}
