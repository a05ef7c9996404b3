//! Convenience re-exports.

pub use crate::config::{ConfigStore, Credentials, ServerConfig, ServerKind, TesterConfig};
pub use crate::error::{Result, TesterError};
pub use crate::mcp::{MCPClient, MCPToolSchema, ToolClient, ToolResponse};
pub use crate::session::SessionSettings;
pub use crate::tokens::{
    create_counter, estimate_tokens, TokenAnalysis, TokenAnalyzer, TokenCounter,
};
