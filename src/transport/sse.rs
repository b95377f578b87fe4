//! Legacy HTTP+SSE binding.
//!
//! `GET /sse` opens a stream whose first event names the endpoint to post
//! to; `POST /messages?sessionId=ID` feeds messages into that session and
//! the replies come back as `message` events on the stream.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::engine::{ProtocolEngine, RequestContext, TransportKind};
use crate::error::GatewayError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::server::AppState;

pub const MESSAGES_PATH: &str = "/messages";

/// SSE keep-alive interval.
const SSE_KEEP_ALIVE_SECS: u64 = 30;

/// Open event streams keyed by session id.
///
/// Insert, lookup and remove all take the same lock, so a lookup never sees
/// a half-inserted or half-removed entry.
#[derive(Clone, Default)]
pub struct SessionTable {
    sessions: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new stream. The returned guard removes the entry when it
    /// is dropped; the receiver yields serialized messages for the stream.
    pub fn open(&self) -> (SessionGuard, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sessions = self.sessions.lock();
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = sessions.entry(candidate.clone()) {
                slot.insert(tx);
                break candidate;
            }
        };
        drop(sessions);

        tracing::debug!(session_id = %id, "sse session opened");
        let guard = SessionGuard {
            id,
            table: self.clone(),
        };
        (guard, rx)
    }

    /// Handle for an open session, or `SessionNotFound`.
    pub fn lookup(&self, session_id: Option<&str>) -> Result<SessionHandle, GatewayError> {
        let id = session_id.ok_or(GatewayError::SessionNotFound)?;
        let sender = self
            .sessions
            .lock()
            .get(id)
            .filter(|tx| !tx.is_closed())
            .cloned()
            .ok_or(GatewayError::SessionNotFound)?;

        Ok(SessionHandle {
            id: id.to_string(),
            sender,
        })
    }

    pub fn close(&self, session_id: &str) {
        if self.sessions.lock().remove(session_id).is_some() {
            tracing::debug!(session_id = %session_id, "sse session closed");
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

/// Owned by the event stream; closing the connection drops it.
pub struct SessionGuard {
    id: String,
    table: SessionTable,
}

impl SessionGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.table.close(&self.id);
    }
}

/// Sending side of one open session.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    sender: mpsc::UnboundedSender<String>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a response for the stream. Returns false once the stream is gone.
    pub fn send(&self, response: &JsonRpcResponse) -> bool {
        match serde_json::to_string(response) {
            Ok(message) => self.sender.send(message).is_ok(),
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "cannot serialize response");
                false
            }
        }
    }
}

/// `GET /sse`.
pub async fn open_stream<E: ProtocolEngine>(
    State(state): State<AppState<E>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (guard, mut rx) = state.sessions.open();
    let mut shutdown = state.shutdown.subscribe();
    let endpoint = format!("{MESSAGES_PATH}?sessionId={}", guard.id());

    let stream = async_stream::stream! {
        // Dropping the stream drops the guard, which closes the session.
        let _guard = guard;
        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint));

        loop {
            let next = tokio::select! {
                message = rx.recv() => message,
                _ = shutdown.wait_for(|stopping| *stopping) => None,
            };
            let Some(message) = next else { break };
            yield Ok(Event::default().event("message").data(message));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS)))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// `POST /messages?sessionId=ID`.
///
/// Answers 202 as soon as the message is accepted; the engine's reply is
/// delivered on the session's stream.
pub async fn post_message<E: ProtocolEngine>(
    State(state): State<AppState<E>>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let handle = state.sessions.lookup(query.session_id.as_deref())?;

    let request: JsonRpcRequest =
        serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidMessage(e.to_string()))?;

    let ctx = RequestContext {
        transport: TransportKind::Sse,
        transport_id: handle.id().to_string(),
        session_id: Some(handle.id().to_string()),
    };
    let engine = Arc::clone(&state.engine);

    // Runs to completion even if the stream closes first; the reply is then dropped.
    tokio::spawn(async move {
        if let Some(response) = engine.handle(&ctx, request).await {
            if !handle.send(&response) {
                tracing::debug!(session_id = %handle.id(), "session closed before reply");
            }
        }
    });

    Ok((StatusCode::ACCEPTED, "Accepted").into_response())
}
