use mcp_demo_server::config::ServerConfig;
use mcp_demo_server::{handlers, server};

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env();
    if config.private_key.is_none() {
        tracing::warn!("MCP_PRIVATE_KEY is not set; every request will be rejected");
    }

    let engine = match handlers::demo_server(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "mcp-demo-server: configuration error");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::serve(&config, engine).await {
        tracing::error!(error = %e, "mcp-demo-server: fatal error");
        std::process::exit(1);
    }
}
