//! CLI entry point for the MCP token tester.

pub mod repl;
pub mod servers;
pub mod tools;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ServerConfig, ServerKind, DEFAULT_CONFIG_PATH};
use crate::error::TesterError;

/// Test MCP servers with token cost analysis
#[derive(Parser, Debug)]
#[command(name = "mcp-token-tester", version, about = "Test MCP servers with token cost analysis")]
pub struct Cli {
    /// Path to the server config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new MCP server configuration
    AddServer(AddServerArgs),
    /// List all configured MCP servers
    ListServers,
    /// Remove a server configuration
    RemoveServer {
        /// Server name
        name: String,
    },
    /// Make a configured server the default
    SetDefault {
        /// Server name
        name: String,
    },
    /// Connect to an MCP server and list its tools
    Connect(ServerArg),
    /// Call a tool and analyze token costs
    CallTool(CallToolArgs),
    /// Start an interactive session with an MCP server
    Interactive(ServerArg),
}

/// Arguments for `add-server`.
#[derive(Args, Debug)]
pub struct AddServerArgs {
    /// Server name
    #[arg(long)]
    pub name: String,

    /// Server type
    #[arg(long = "type", value_enum)]
    pub server_type: ServerKind,

    /// Command to run (for stdio)
    #[arg(long)]
    pub command: Option<String>,

    /// Path to executable (for stdio)
    #[arg(long)]
    pub path: Option<String>,

    /// Arguments (comma-separated)
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// URL (for HTTP/SSE servers)
    #[arg(long)]
    pub url: Option<String>,

    /// Auto-start server (default)
    #[arg(long, overrides_with = "no_auto_start")]
    pub auto_start: bool,

    /// Do not auto-start server
    #[arg(long, overrides_with = "auto_start")]
    pub no_auto_start: bool,

    /// Environment variable for the server process (KEY=VALUE, repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,
}

impl AddServerArgs {
    /// Build the descriptor these flags describe.
    pub fn into_server_config(self) -> ServerConfig {
        let args = self
            .args
            .as_deref()
            .map(split_args)
            .unwrap_or_default();
        ServerConfig {
            name: self.name,
            server_type: self.server_type,
            command: self.command,
            path: self.path,
            args,
            url: self.url,
            auto_start: !self.no_auto_start,
            env_vars: self.env.into_iter().collect::<BTreeMap<_, _>>(),
        }
    }
}

/// `--server` selection shared by commands that connect.
#[derive(Args, Debug)]
pub struct ServerArg {
    /// Server name (defaults to the default server)
    #[arg(long)]
    pub server: Option<String>,
}

/// Arguments for `call-tool`.
#[derive(Args, Debug)]
pub struct CallToolArgs {
    /// Server name to use
    #[arg(long)]
    pub server: Option<String>,

    /// Tool name to call
    #[arg(long)]
    pub tool: String,

    /// Tool arguments as JSON string
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// LLM provider for token counting
    #[arg(long, default_value = "anthropic")]
    pub provider: String,

    /// Model for token counting (defaults to ANTHROPIC_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Token overhead estimate (defaults to the config file value)
    #[arg(long)]
    pub overhead: Option<u64>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Comma-separated list, each item trimmed, empty items dropped.
pub fn split_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Map a [`TesterError`] to a user-facing message with actionable guidance.
pub fn format_error_help(err: &TesterError) -> String {
    match err {
        TesterError::ServerNotFound(_) => {
            format!("{err}. Run: mcp-token-tester list-servers")
        }
        TesterError::Configuration(msg) if msg.starts_with("No server configuration") => {
            format!("{msg} Run: mcp-token-tester add-server --name <NAME> --type <TYPE> ...")
        }
        TesterError::Authentication(msg) => {
            format!("Authentication failed: {msg}. Check ANTHROPIC_API_KEY in your environment or .env")
        }
        other if other.is_remote() => {
            format!("{other}. Check that the server is running and reachable")
        }
        other => format!("{other}"),
    }
}
