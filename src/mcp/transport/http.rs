use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::ServiceExt;
use rmcp::transport::StreamableHttpClientTransport;
use tracing::debug;

use super::{map_client_initialize_error, MCPRunningService, MCPTransport};
use crate::config::ServerKind;
use crate::error::Result;

/// Streamable HTTP transport (for remote MCP servers).
pub struct HttpTransport {
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MCPTransport for HttpTransport {
    fn kind(&self) -> ServerKind {
        ServerKind::Http
    }

    async fn connect(&mut self, client_info: ClientInfo) -> Result<MCPRunningService> {
        debug!(url = %self.url, "connecting to streamable HTTP MCP server");
        let transport = StreamableHttpClientTransport::from_uri(self.url.as_str());

        client_info
            .into_dyn()
            .serve(transport)
            .await
            .map_err(map_client_initialize_error)
    }
}
