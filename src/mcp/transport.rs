//! MCP transport layer.

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService};

use crate::config::{ServerConfig, ServerKind};
use crate::error::{Result, TesterError};

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send + Sync {
    /// Which kind of server this transport talks to.
    fn kind(&self) -> ServerKind;

    /// Open the transport and run the MCP initialize handshake.
    async fn connect(&mut self, client_info: ClientInfo) -> Result<MCPRunningService>;
}

mod http;
mod sse;
mod stdio;

pub use http::HttpTransport;
pub use sse::SseTransport;
pub use stdio::StdioTransport;

/// Build the transport described by a server descriptor.
pub fn transport_for(server: &ServerConfig) -> Result<Box<dyn MCPTransport>> {
    match server.server_type {
        ServerKind::Stdio => {
            let command = server.executable().ok_or_else(|| {
                TesterError::Configuration("No command or path specified for stdio server".into())
            })?;
            Ok(Box::new(
                StdioTransport::new(command, server.args.clone()).with_env(server.env_vars.clone()),
            ))
        }
        ServerKind::Http => {
            let url = require_url(server, "HTTP")?;
            Ok(Box::new(HttpTransport::new(url)))
        }
        ServerKind::Sse => {
            let url = require_url(server, "SSE")?;
            Ok(Box::new(SseTransport::new(url)))
        }
    }
}

fn require_url<'a>(server: &'a ServerConfig, label: &str) -> Result<&'a str> {
    server
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| TesterError::Configuration(format!("No URL specified for {label} server")))
}

pub(crate) fn map_client_initialize_error(error: ClientInitializeError) -> TesterError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            TesterError::Connection(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => TesterError::Connection(
            format!("MCP initialize transport error ({context}): {error}"),
        ),
        ClientInitializeError::JsonRpcError(error) => TesterError::protocol(
            "initialize",
            format!("JSON-RPC error {}: {}", error.code.0, error.message),
        ),
        ClientInitializeError::Cancelled => {
            TesterError::Connection("MCP initialize cancelled".into())
        }
        other => TesterError::protocol("initialize", other.to_string()),
    }
}
