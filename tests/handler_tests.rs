//! Integration tests for the demo engine: dispatch of protocol methods,
//! the `add` tool, and the greeting resource.
//!
//! Requests go through `ProtocolEngine::handle` exactly as a transport would
//! send them.

use serde_json::{json, Value};

use mcp_demo_server::config::ServerConfig;
use mcp_demo_server::engine::{McpServer, ProtocolEngine, RequestContext, TransportKind};
use mcp_demo_server::handlers;
use mcp_demo_server::protocol::{JsonRpcRequest, JsonRpcResponse, RpcId};

fn test_config() -> ServerConfig {
    ServerConfig {
        private_key: Some("test-key".into()),
        port: 0,
        // Unroutable: these tests never reach the weather upstreams.
        geocoding_url: "http://127.0.0.1:9/v1/search".into(),
        forecast_url: "http://127.0.0.1:9/v1/forecast".into(),
    }
}

fn engine() -> McpServer {
    handlers::demo_server(&test_config()).unwrap()
}

fn ctx() -> RequestContext {
    RequestContext {
        transport: TransportKind::Streamable,
        transport_id: "test".into(),
        session_id: None,
    }
}

fn make_request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::Number(id)),
        method: method.into(),
        params,
    }
}

async fn call(server: &McpServer, method: &str, params: Value) -> JsonRpcResponse {
    server
        .handle(&ctx(), make_request(1, method, Some(params)))
        .await
        .expect("request must be answered")
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let resp = call(server, "tools/call", json!({ "name": name, "arguments": arguments })).await;
    assert!(resp.error.is_none(), "tools/call must not fail at the protocol level");
    resp.result.unwrap()
}

// ---------------------------------------------------------------------------
// protocol methods
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_echoes_supported_version() {
    let server = engine();
    let resp = call(&server, "initialize", json!({ "protocolVersion": "2024-11-05" })).await;
    let result = resp.result.unwrap();

    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "demo-server");
    assert_eq!(result["serverInfo"]["version"], "1.0.0");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
}

#[tokio::test]
async fn initialize_falls_back_to_latest_version() {
    let server = engine();
    let resp = call(&server, "initialize", json!({ "protocolVersion": "1999-01-01" })).await;
    assert_eq!(
        resp.result.unwrap()["protocolVersion"],
        mcp_demo_server::engine::LATEST_PROTOCOL_VERSION
    );
}

#[tokio::test]
async fn notifications_get_no_response() {
    let server = engine();
    let notification = JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: None,
        method: "notifications/initialized".into(),
        params: None,
    };
    assert!(server.handle(&ctx(), notification).await.is_none());
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let server = engine();
    let resp = call(&server, "sampling/createMessage", json!({})).await;
    assert_eq!(resp.error.unwrap().code, -32601);
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let server = engine();
    let mut req = make_request(1, "ping", None);
    req.jsonrpc = "1.0".into();
    let resp = server.handle(&ctx(), req).await.unwrap();
    assert_eq!(resp.error.unwrap().code, -32600);
}

#[tokio::test]
async fn tools_list_advertises_both_tools_with_schemas() {
    let server = engine();
    let resp = call(&server, "tools/list", json!({})).await;
    let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["add", "getWeather"]);

    let add = &tools[0];
    assert_eq!(add["title"], "Addition Tool");
    assert_eq!(add["inputSchema"]["properties"]["a"]["type"], "number");
    assert_eq!(add["outputSchema"]["properties"]["result"]["type"], "number");

    let weather = &tools[1];
    assert_eq!(weather["inputSchema"]["required"], json!(["city"]));
    assert_eq!(weather["outputSchema"]["properties"]["result"]["type"], "string");
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_returns_exact_sum() {
    let server = engine();
    let pairs = [
        (1.0, 2.0),
        (-5.0, 5.0),
        (0.1, 0.2),
        (1e15, 1.0),
        (-2.5, -0.25),
        (123456.789, 0.001),
    ];

    for (a, b) in pairs {
        let result = call_tool(&server, "add", json!({ "a": a, "b": b })).await;
        assert!(result.get("isError").is_none(), "add({a}, {b}) failed: {result}");
        let structured = result["structuredContent"]["result"].as_f64().unwrap();
        assert_eq!(structured, a + b, "add({a}, {b})");

        let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["result"].as_f64().unwrap(), a + b);
    }
}

#[tokio::test]
async fn add_text_renders_integers_without_fraction() {
    let server = engine();
    let result = call_tool(&server, "add", json!({ "a": 1, "b": 2 })).await;
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["text"], r#"{"result":3}"#);
    assert_eq!(result["structuredContent"], json!({ "result": 3 }));
}

#[tokio::test]
async fn add_rejects_non_numeric_input() {
    let server = engine();
    let result = call_tool(&server, "add", json!({ "a": "one", "b": 2 })).await;
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Input validation error"));
}

#[tokio::test]
async fn add_rejects_missing_arguments() {
    let server = engine();
    let resp = call(&server, "tools/call", json!({ "name": "add" })).await;
    assert_eq!(resp.result.unwrap()["isError"], true);
}

#[tokio::test]
async fn unknown_tool_is_a_tool_error() {
    let server = engine();
    let result = call_tool(&server, "multiply", json!({ "a": 1, "b": 2 })).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["content"][0]["text"], "Tool multiply not found");
}

#[tokio::test]
async fn tools_call_without_name_is_invalid_params() {
    let server = engine();
    let resp = call(&server, "tools/call", json!({})).await;
    assert_eq!(resp.error.unwrap().code, -32602);
}

// ---------------------------------------------------------------------------
// greeting resource
// ---------------------------------------------------------------------------

#[tokio::test]
async fn greeting_resource_reads_name_from_uri() {
    let server = engine();
    let resp = call(&server, "resources/read", json!({ "uri": "greeting://Ada" })).await;
    let contents = resp.result.unwrap()["contents"].clone();

    assert_eq!(contents, json!([{ "uri": "greeting://Ada", "text": "Hello, Ada!" }]));
}

#[tokio::test]
async fn unknown_resource_is_invalid_params() {
    let server = engine();
    let resp = call(&server, "resources/read", json!({ "uri": "farewell://Ada" })).await;
    let error = resp.error.unwrap();
    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "Resource farewell://Ada not found");
}

#[tokio::test]
async fn templates_are_listed_but_not_enumerated() {
    let server = engine();

    let listed = call(&server, "resources/list", json!({})).await.result.unwrap();
    assert_eq!(listed["resources"], json!([]));

    let templates = call(&server, "resources/templates/list", json!({})).await.result.unwrap();
    assert_eq!(
        templates["resourceTemplates"],
        json!([{
            "uriTemplate": "greeting://{name}",
            "name": "greeting",
            "title": "Greeting Resource",
            "description": "Dynamic greeting generator"
        }])
    );
}

#[tokio::test]
async fn registering_twice_is_rejected() {
    let mut server = engine();
    let err = handlers::register_all(&mut server, &test_config()).unwrap_err();
    assert_eq!(err.to_string(), "Tool already registered: add");
}
