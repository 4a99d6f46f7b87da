//! JSON-RPC 2.0 protocol layer: wire types and the stdio transport.

pub mod stdio;
pub mod types;

pub use stdio::StdioTransport;
pub use types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
