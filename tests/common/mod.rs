//! Shared test helpers and mock tool client.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use mcp_token_tester::error::{Result, TesterError};
use mcp_token_tester::mcp::{MCPToolSchema, ToolClient, ToolResponse};

/// A mock client that echoes arguments back. The `fail` tool errors, `broken`
/// returns an error result and `hang` never answers.
pub struct MockToolClient {
    tools: Vec<MCPToolSchema>,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockToolClient {
    pub fn new(names: &[&str]) -> Self {
        Self {
            tools: names.iter().map(|name| tool(name)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolClient for MockToolClient {
    fn tools(&self) -> &[MCPToolSchema] {
        &self.tools
    }

    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        match name {
            "fail" => Err(TesterError::protocol("call_tool", "MCP error -32603: boom")),
            "broken" => Ok(ToolResponse::new(
                vec![json!({ "type": "text", "text": "tool crashed" })],
                true,
            )),
            "hang" => std::future::pending().await,
            _ => Ok(ToolResponse::text(format!("echo {arguments}"))),
        }
    }
}

pub fn tool(name: &str) -> MCPToolSchema {
    MCPToolSchema {
        name: name.to_string(),
        description: Some(format!("{name} tool")),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}
