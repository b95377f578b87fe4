//! Demonstration MCP server.
//!
//! Exposes the `add` and `getWeather` tools and the `greeting://{name}`
//! resource over JSON-RPC 2.0, served on a streamable HTTP endpoint
//! (`POST /mcp`) and the legacy SSE binding (`GET /sse` + `POST /messages`),
//! all behind a static `x-mcp-key` check.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

pub mod schema;
