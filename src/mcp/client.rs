//! MCP client for connecting to MCP servers.

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, ClientInfo, JsonObject, ProtocolVersion},
    service::ServiceError,
};
use tracing::{debug, info, warn};

use super::response::ToolResponse;
use super::schema::MCPToolSchema;
use super::transport::{transport_for, MCPRunningService, MCPTransport};
use crate::config::ServerConfig;
use crate::error::{Result, TesterError};

/// The part of a connected client the interactive session needs.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Tools discovered when the connection was opened.
    fn tools(&self) -> &[MCPToolSchema];

    /// Invoke a tool and return its raw response.
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolResponse>;

    fn tool(&self, name: &str) -> Option<&MCPToolSchema> {
        self.tools().iter().find(|tool| tool.name == name)
    }

    fn tool_names(&self) -> Vec<&str> {
        self.tools().iter().map(|tool| tool.name.as_str()).collect()
    }
}

/// Client for a single configured MCP server.
///
/// The transport is built from the server descriptor on first connect. At
/// most one session is open at a time.
pub struct MCPClient {
    server: ServerConfig,
    transport: Option<Box<dyn MCPTransport>>,
    session: Option<MCPRunningService>,
    tools: Vec<MCPToolSchema>,
}

impl MCPClient {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            transport: None,
            session: None,
            tools: Vec::new(),
        }
    }

    /// Use an explicit transport instead of deriving one from the descriptor.
    pub fn with_transport(server: ServerConfig, transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new(server)
        }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.is_closed())
    }

    /// Open the transport, run the MCP handshake and cache the tool list.
    ///
    /// A failed tool listing leaves the client connected with no tools.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let mut transport = match self.transport.take() {
            Some(transport) => transport,
            None => transport_for(&self.server)?,
        };
        info!(
            server = %self.server.name,
            kind = %transport.kind(),
            "connecting to MCP server"
        );
        let connected = transport.connect(client_info()).await;
        self.transport = Some(transport);
        self.session = Some(connected?);

        self.tools = match self.list_tools_from_active_session().await {
            Ok(tools) => tools.into_iter().map(MCPToolSchema::from).collect(),
            Err(error) => {
                warn!(
                    server = %self.server.name,
                    error = %map_service_error("list_tools", error),
                    "failed to list tools"
                );
                Vec::new()
            }
        };
        debug!(count = self.tools.len(), "tools discovered");
        Ok(())
    }

    /// Close the session. Safe to call when already disconnected.
    pub async fn disconnect(&mut self) {
        self.tools.clear();
        let Some(session) = self.session.take() else {
            return;
        };
        match session.cancel().await {
            Ok(reason) => debug!(server = %self.server.name, ?reason, "MCP session closed"),
            Err(error) => warn!(
                server = %self.server.name,
                error = %error,
                "failed to close MCP session cleanly"
            ),
        }
    }

    async fn list_tools_from_active_session(
        &self,
    ) -> std::result::Result<Vec<rmcp::model::Tool>, ServiceError> {
        let session = self.session.as_ref().ok_or(ServiceError::TransportClosed)?;

        match session.list_all_tools().await {
            Ok(tools) => Ok(tools),
            Err(ServiceError::UnexpectedResponse) => {
                session.list_tools(None).await.map(|page| page.tools)
            }
            Err(error) => Err(error),
        }
    }

    fn session_ref(&self) -> Result<&MCPRunningService> {
        self.session
            .as_ref()
            .filter(|session| !session.is_closed())
            .ok_or(TesterError::NotConnected)
    }
}

#[async_trait]
impl ToolClient for MCPClient {
    fn tools(&self) -> &[MCPToolSchema] {
        &self.tools
    }

    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolResponse> {
        let session = self.session_ref()?;
        let arguments = coerce_tool_arguments(arguments)?;
        debug!(tool = name, "calling MCP tool");

        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        Ok(ToolResponse::from(result))
    }
}

fn client_info() -> ClientInfo {
    let mut info = ClientInfo {
        protocol_version: ProtocolVersion::LATEST,
        ..Default::default()
    };
    info.client_info.name = env!("CARGO_PKG_NAME").into();
    info.client_info.version = env!("CARGO_PKG_VERSION").into();
    info
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                TesterError::InvalidArgument(format!("tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(TesterError::InvalidArgument(format!(
            "tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn map_service_error(context: &str, error: ServiceError) -> TesterError {
    match error {
        ServiceError::McpError(error) => TesterError::protocol(
            context,
            format!("MCP error {}: {}", error.code.0, error.message),
        ),
        ServiceError::TransportSend(error) => {
            TesterError::Connection(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            TesterError::Connection(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => {
            TesterError::protocol(context, "unexpected MCP response")
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            TesterError::Connection(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => TesterError::Connection(format!(
            "{context}: MCP request timed out after {}ms",
            timeout.as_millis()
        )),
        other => TesterError::protocol(context, format!("MCP service error: {other}")),
    }
}
