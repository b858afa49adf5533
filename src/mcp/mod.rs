//! MCP stdio surface
//!
//! Newline-delimited JSON-RPC 2.0 over a byte stream:
//! - `messages`: request/response/error envelopes
//! - `codec`: line framing for `FramedRead`/`FramedWrite`
//! - `protocol`: initialize, tools/list and tools/call payloads
//! - `handler`: method routing onto the tool catalog and dispatcher
//! - `server`: read loop, concurrent tool calls, cancellation

pub mod codec;
pub mod handler;
pub mod messages;
pub mod protocol;
pub mod server;

pub use codec::{Incoming, McpCodec};
pub use handler::McpHandler;
pub use messages::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use protocol::{InitializeResult, McpToolDefinition, ToolsCallParams, ToolsCallResult, ToolsListResult};
pub use server::{McpServer, McpServerConfig};
