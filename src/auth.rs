use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::GatewayError;

/// Header carrying the caller's credential.
pub const KEY_HEADER: &str = "x-mcp-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized,
    Rejected,
}

/// Static shared-secret check run in front of every route.
#[derive(Clone)]
pub struct AuthGate {
    expected: Option<String>,
}

impl AuthGate {
    /// `None` builds a gate that rejects everything.
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }

    pub fn check(&self, presented: Option<&str>) -> AuthDecision {
        match (&self.expected, presented) {
            (Some(expected), Some(presented))
                if bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) =>
            {
                AuthDecision::Authorized
            }
            _ => AuthDecision::Rejected,
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("configured", &self.expected.is_some())
            .finish()
    }
}

pub async fn require_key(
    State(gate): State<Arc<AuthGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match gate.check(presented) {
        AuthDecision::Authorized => next.run(request).await,
        AuthDecision::Rejected => GatewayError::Unauthorized.into_response(),
    }
}
