use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::auth::{require_key, AuthGate};
use crate::config::ServerConfig;
use crate::engine::ProtocolEngine;
use crate::error::ServeError;
use crate::transport::sse::{open_stream, post_message, MESSAGES_PATH};
use crate::transport::streamable::post_mcp;
use crate::transport::SessionTable;

/// Shared state handed to every route.
pub struct AppState<E> {
    pub engine: Arc<E>,
    pub sessions: SessionTable,
    pub gate: Arc<AuthGate>,
    /// Flipped to `true` once shutdown starts; open event streams end on it.
    pub shutdown: Arc<watch::Sender<bool>>,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            sessions: self.sessions.clone(),
            gate: Arc::clone(&self.gate),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<E: ProtocolEngine> AppState<E> {
    pub fn new(engine: E, gate: AuthGate) -> Self {
        Self {
            engine: Arc::new(engine),
            sessions: SessionTable::new(),
            gate: Arc::new(gate),
            shutdown: Arc::new(watch::channel(false).0),
        }
    }
}

/// All routes, with the key check in front of every one of them,
/// including the fallback. Rejected requests never reach the trace layer.
pub fn router<E: ProtocolEngine>(state: AppState<E>) -> Router {
    Router::new()
        .route("/mcp", post(post_mcp::<E>))
        .route("/sse", get(open_stream::<E>))
        .route(MESSAGES_PATH, post(post_message::<E>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(Arc::clone(&state.gate), require_key))
        .with_state(state)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Bind `0.0.0.0:{port}` and serve until ctrl-c.
pub async fn serve<E: ProtocolEngine>(config: &ServerConfig, engine: E) -> Result<(), ServeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    let state = AppState::new(engine, AuthGate::new(config.private_key.clone()));
    tracing::info!(addr = %addr, "Demo MCP Server running on http://localhost:{}/mcp", config.port);

    serve_until(listener, state, shutdown_signal()).await
}

/// Serve on `listener` until `signal` resolves. Open event streams are ended
/// at that point so the graceful drain does not wait on them.
pub async fn serve_until<E, F>(listener: TcpListener, state: AppState<E>, signal: F) -> Result<(), ServeError>
where
    E: ProtocolEngine,
    F: Future<Output = ()> + Send + 'static,
{
    let shutdown = Arc::clone(&state.shutdown);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            signal.await;
            shutdown.send_replace(true);
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
