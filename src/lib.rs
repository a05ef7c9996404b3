//! MCP token tester
//!
//! Connects to Model Context Protocol servers over stdio, streamable HTTP or
//! legacy HTTP+SSE, calls their tools, and estimates the token cost of each
//! request/response pair against an Anthropic model.
//!
//! # Quick Start
//!
//! ```no_run
//! use mcp_token_tester::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> mcp_token_tester::error::Result<()> {
//! let server = ServerConfig::stdio("files", "npx", vec!["-y".into(), "server-filesystem".into()]);
//! let mut client = MCPClient::new(server);
//! client.connect().await?;
//!
//! let args = json!({"path": "/tmp"});
//! let response = client.call_tool("list_directory", args.clone()).await?;
//!
//! let credentials = Credentials::from_env();
//! let counter = create_counter("anthropic", credentials.default_model(), &credentials)?;
//! let analysis = TokenAnalyzer::new(counter, 100)
//!     .analyze_tool_call("list_directory", &args, &response)
//!     .await;
//! println!("{}", analysis.total_tokens);
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod tokens;

#[cfg(feature = "cli")]
pub mod cli;
