use std::collections::BTreeMap;

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::ServiceExt;
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;
use tracing::debug;

use super::{map_client_initialize_error, MCPRunningService, MCPTransport};
use crate::config::ServerKind;
use crate::error::{Result, TesterError};

/// Stdio-based MCP transport (for local MCP servers).
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl StdioTransport {
    /// Create a stdio transport from command and args.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Create a stdio transport from command only.
    pub fn from_command(command: impl Into<String>) -> Self {
        Self::new(command, Vec::new())
    }

    /// Extra environment variables for the child, added to the inherited ones.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command.args(&self.args).envs(&self.env);
        command
    }
}

#[async_trait]
impl MCPTransport for StdioTransport {
    fn kind(&self) -> ServerKind {
        ServerKind::Stdio
    }

    async fn connect(&mut self, client_info: ClientInfo) -> Result<MCPRunningService> {
        debug!(command = %self.command, args = ?self.args, "spawning stdio MCP server");
        let transport = TokioChildProcess::new(self.build_command()).map_err(|error| {
            TesterError::Connection(format!("failed to spawn '{}': {error}", self.command))
        })?;

        client_info
            .into_dyn()
            .serve(transport)
            .await
            .map_err(map_client_initialize_error)
    }
}
