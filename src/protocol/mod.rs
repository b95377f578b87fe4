pub mod request;
pub mod response;

pub use request::{
    AddParams, ClientInfo, GetWeatherParams, InitializeParams, JsonRpcRequest,
    ReadResourceParams, RpcId, ToolCallParams,
};
pub use response::{
    JsonRpcError, JsonRpcResponse, ReadResourceResult, ResourceContents, ToolResult,
    ToolResultContent,
};
