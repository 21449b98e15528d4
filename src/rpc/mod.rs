//! JSON-RPC 2.0 over newline-delimited frames, with the MCP method surface.

pub mod client;
pub mod protocol;
pub mod server;

pub use protocol::{
    CallToolParams, CallToolResult, Content, InitializeResult, InputSchema, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ToolSchema,
};
pub use server::Server;
