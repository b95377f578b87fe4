//! Streamable HTTP binding in JSON-response mode.
//!
//! Every `POST /mcp` gets its own [`StreamableTransport`] with no session id.
//! Instances are never pooled: request ids from concurrent callers can
//! collide, so each call is correlated only within its own instance.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::engine::{ProtocolEngine, RequestContext, TransportKind};
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::AppState;

pub struct StreamableTransport<E> {
    id: String,
    engine: Arc<E>,
}

impl<E: ProtocolEngine> StreamableTransport<E> {
    pub fn open(engine: Arc<E>) -> Self {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(transport_id = %id, "streamable transport opened");
        Self { id, engine }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn context(&self) -> RequestContext {
        RequestContext {
            transport: TransportKind::Streamable,
            transport_id: self.id.clone(),
            session_id: None,
        }
    }

    /// Decode a POST body, run it through the engine, and frame the reply.
    pub async fn handle_request(&self, body: &[u8]) -> Response {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(transport_id = %self.id, error = %e, "unparsable request body");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(JsonRpcResponse::error(None, JsonRpcError::parse_error())),
                )
                    .into_response();
            }
        };

        let ctx = self.context();

        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(JsonRpcResponse::error(None, JsonRpcError::invalid_request())),
                    )
                        .into_response();
                }

                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    match serde_json::from_value::<JsonRpcRequest>(item) {
                        Ok(req) => {
                            if let Some(resp) = self.engine.handle(&ctx, req).await {
                                responses.push(resp);
                            }
                        }
                        Err(_) => responses.push(JsonRpcResponse::error(None, JsonRpcError::invalid_request())),
                    }
                }

                if responses.is_empty() {
                    StatusCode::ACCEPTED.into_response()
                } else {
                    Json(responses).into_response()
                }
            }
            single => {
                let req: JsonRpcRequest = match serde_json::from_value(single) {
                    Ok(r) => r,
                    Err(_) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(JsonRpcResponse::error(None, JsonRpcError::invalid_request())),
                        )
                            .into_response();
                    }
                };

                match self.engine.handle(&ctx, req).await {
                    Some(resp) => Json(resp).into_response(),
                    None => StatusCode::ACCEPTED.into_response(),
                }
            }
        }
    }
}

impl<E> Drop for StreamableTransport<E> {
    fn drop(&mut self) {
        tracing::debug!(transport_id = %self.id, "streamable transport closed");
    }
}

/// `POST /mcp`. If the client disconnects, axum drops this future and the
/// transport is closed with it, whether or not the call had finished.
pub async fn post_mcp<E: ProtocolEngine>(State(state): State<AppState<E>>, body: Bytes) -> Response {
    let transport = StreamableTransport::open(Arc::clone(&state.engine));
    transport.handle_request(&body).await
}
