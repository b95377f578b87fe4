use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use mcp_demo_server::auth::AuthGate;
use mcp_demo_server::config::ServerConfig;
use mcp_demo_server::error::ServeError;
use mcp_demo_server::server::AppState;
use mcp_demo_server::{handlers, server};

fn test_config(port: u16) -> ServerConfig {
    ServerConfig {
        private_key: Some("test-key".into()),
        port,
        geocoding_url: "http://127.0.0.1:9/v1/search".into(),
        forecast_url: "http://127.0.0.1:9/v1/forecast".into(),
    }
}

#[tokio::test]
async fn occupied_port_is_a_bind_failure() {
    let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let config = test_config(port);
    let engine = handlers::demo_server(&config).unwrap();

    let err = server::serve(&config, engine).await.unwrap_err();
    match err {
        ServeError::Bind { addr, source } => {
            assert_eq!(addr.port(), port);
            assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
        }
        other => panic!("expected bind failure, got {other}"),
    }
}

#[tokio::test]
async fn shutdown_completes_with_an_event_stream_attached() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let engine = handlers::demo_server(&test_config(addr.port())).unwrap();
    let state = AppState::new(engine, AuthGate::new(Some("test-key".into())));
    let sessions = state.sessions.clone();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve_until(listener, state, async move {
        let _ = stop_rx.await;
    }));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /sse HTTP/1.1\r\nhost: localhost\r\nx-mcp-key: test-key\r\naccept: text/event-stream\r\n\r\n")
        .await
        .unwrap();

    let mut seen = String::new();
    let mut buf = [0u8; 1024];
    while !seen.contains("sessionId=") {
        let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("no endpoint event")
            .unwrap();
        assert!(n > 0, "connection closed before the endpoint event");
        seen.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    assert_eq!(sessions.len(), 1);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server kept running with a stream attached")
        .unwrap();
    assert!(result.is_ok());
    assert!(sessions.is_empty());
}
