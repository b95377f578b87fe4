pub mod add;
pub mod greeting;
pub mod weather;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::{McpServer, ProtocolEngine};
use crate::registry::RegistryError;

pub const SERVER_NAME: &str = "demo-server";
pub const SERVER_VERSION: &str = "1.0.0";

/// Register the demo tools and resources on any engine.
pub fn register_all<E: ProtocolEngine>(engine: &mut E, config: &ServerConfig) -> Result<(), RegistryError> {
    engine.register_tool(Arc::new(add::AddTool))?;
    engine.register_tool(Arc::new(weather::GetWeatherTool::new(
        weather::WeatherClient::from_config(config),
    )))?;
    engine.register_resource(greeting::descriptor()?)?;
    Ok(())
}

/// The demo server with everything registered.
pub fn demo_server(config: &ServerConfig) -> Result<McpServer, RegistryError> {
    let mut server = McpServer::new(SERVER_NAME, SERVER_VERSION);
    register_all(&mut server, config)?;
    Ok(server)
}
