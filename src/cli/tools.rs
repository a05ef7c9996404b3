//! Commands that connect to a server: `connect`, `call-tool`, `interactive`.
//!
//! Every handler disconnects before returning, on success and on error.

use std::io::Write;

use tokio::io::AsyncBufRead;

use super::repl::{analyze_and_print, InteractiveSession};
use super::{CallToolArgs, ServerArg};
use crate::config::env::Credentials;
use crate::config::{ConfigStore, ServerConfig};
use crate::error::{Result, TesterError};
use crate::mcp::{MCPClient, ToolClient};
use crate::session::SessionSettings;

async fn open_client(server: &ServerConfig, out: &mut impl Write) -> Result<MCPClient> {
    writeln!(out, "Connecting to {}...", server.name)?;
    let mut client = MCPClient::new(server.clone());
    if let Err(e) = client.connect().await {
        writeln!(out, "Failed to connect.")?;
        client.disconnect().await;
        return Err(e);
    }
    Ok(client)
}

/// Handle `connect`.
pub async fn handle_connect(store: &ConfigStore, args: ServerArg, out: &mut impl Write) -> Result<()> {
    let server = store.resolve(args.server.as_deref())?;
    let mut client = open_client(server, out).await?;
    let result = print_tools(&client, out);
    client.disconnect().await;
    result
}

fn print_tools(client: &MCPClient, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Connected successfully!")?;
    let tools = client.tools();
    if tools.is_empty() {
        writeln!(out, "No tools available.")?;
        return Ok(());
    }
    writeln!(out, "\nAvailable tools ({}):", tools.len())?;
    for tool in tools {
        writeln!(out, "  • {}: {}", tool.name, tool.description_or_empty())?;
    }
    Ok(())
}

/// Handle `call-tool`.
pub async fn handle_call_tool(
    store: &ConfigStore,
    args: CallToolArgs,
    credentials: &Credentials,
    out: &mut impl Write,
) -> Result<()> {
    let server = store.resolve(args.server.as_deref())?;
    let arguments = parse_tool_arguments(args.args.as_deref())?;

    let settings = SessionSettings {
        provider: args.provider,
        model: args
            .model
            .unwrap_or_else(|| credentials.default_model().to_string()),
        overhead: args.overhead.unwrap_or_else(|| store.token_overhead()),
        auto_tokens: true,
    };

    let mut client = open_client(server, out).await?;
    let result = call_and_analyze(&client, &args.tool, arguments, &settings, credentials, out).await;
    client.disconnect().await;
    result
}

fn parse_tool_arguments(raw: Option<&str>) -> Result<serde_json::Value> {
    match raw {
        None => Ok(serde_json::json!({})),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| TesterError::InvalidArgument(format!("Invalid JSON in arguments: {e}"))),
    }
}

async fn call_and_analyze(
    client: &MCPClient,
    tool: &str,
    arguments: serde_json::Value,
    settings: &SessionSettings,
    credentials: &Credentials,
    out: &mut impl Write,
) -> Result<()> {
    if client.tool(tool).is_none() {
        writeln!(out, "Tool '{tool}' not found.")?;
        let available = client.tool_names();
        if !available.is_empty() {
            writeln!(out, "Available tools: {}", available.join(", "))?;
        }
        return Err(TesterError::ToolNotFound(tool.to_string()));
    }

    writeln!(out, "Calling tool '{tool}'...")?;
    let response = client.call_tool(tool, arguments.clone()).await?;

    writeln!(out, "\n--- Tool Response ---")?;
    writeln!(out, "{}", response.to_pretty_json())?;

    analyze_and_print(settings, credentials, tool, &arguments, &response, out).await
}

/// Handle `interactive`, reading commands from `input`.
pub async fn handle_interactive<R>(
    store: &ConfigStore,
    args: ServerArg,
    credentials: Credentials,
    input: R,
    out: &mut impl Write,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let server = store.resolve(args.server.as_deref())?;
    let mut client = open_client(server, out).await?;
    writeln!(out, "Connected! Type 'help' for commands, 'exit' to quit.")?;

    let settings = SessionSettings::new(&credentials, store.token_overhead());
    let result = InteractiveSession::new(&client, settings, credentials)
        .run(input, out)
        .await;
    client.disconnect().await;
    result
}
