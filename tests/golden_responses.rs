//! Byte-level snapshots of responses clients parse directly.

use axum::response::IntoResponse;
use serde_json::json;

use mcp_demo_server::error::GatewayError;
use mcp_demo_server::protocol::{JsonRpcError, JsonRpcResponse, RpcId, ToolResult};

#[tokio::test]
async fn unauthorized_body_snapshot() {
    let response = GatewayError::Unauthorized.into_response();
    assert_eq!(response.status(), 401);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], br#"{"error":"Unauthorized"}"#);
}

#[test]
fn tool_result_snapshot() {
    let result = ToolResult::structured(r#"{"result":3}"#, json!({ "result": 3 }));
    let resp = JsonRpcResponse::success(Some(RpcId::Number(1)), serde_json::to_value(&result).unwrap());

    let expected = r#"{
  "jsonrpc": "2.0",
  "id": 1,
  "result": {
    "content": [
      {
        "text": "{\"result\":3}",
        "type": "text"
      }
    ],
    "structuredContent": {
      "result": 3
    }
  }
}"#;
    assert_eq!(serde_json::to_string_pretty(&resp).unwrap(), expected);
}

#[test]
fn error_response_snapshot() {
    let resp = JsonRpcResponse::error(Some(RpcId::Str("abc".into())), JsonRpcError::method_not_found("foo"));
    assert_eq!(
        serde_json::to_string(&resp).unwrap(),
        r#"{"jsonrpc":"2.0","id":"abc","error":{"code":-32601,"message":"Method not found: foo"}}"#
    );
}
