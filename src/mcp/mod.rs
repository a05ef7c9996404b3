//! Model Context Protocol (MCP) client and transports.

pub mod client;
pub mod response;
pub mod schema;
pub mod transport;

pub use client::{MCPClient, ToolClient};
pub use response::ToolResponse;
pub use schema::MCPToolSchema;
pub use transport::{transport_for, HttpTransport, MCPTransport, SseTransport, StdioTransport};
