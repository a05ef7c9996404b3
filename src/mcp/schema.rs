//! MCP schema types.

use serde::{Deserialize, Serialize};

/// Schema for a tool exposed by an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPToolSchema {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl MCPToolSchema {
    /// Description text, empty when the server sent none.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

impl From<rmcp::model::Tool> for MCPToolSchema {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()),
            input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rmcp_tool_fields_are_copied() {
        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("required".into(), json!(["city", "units"]));
        let tool = rmcp::model::Tool::new("weather", "lookup weather", schema);

        let mapped = MCPToolSchema::from(tool);
        assert_eq!(mapped.name, "weather");
        assert_eq!(mapped.description_or_empty(), "lookup weather");
        assert_eq!(mapped.input_schema["type"], "object");
        assert_eq!(mapped.input_schema["required"], json!(["city", "units"]));
    }

    #[test]
    fn missing_description_renders_empty() {
        let tool = MCPToolSchema {
            name: "ping".into(),
            description: None,
            input_schema: json!({}),
        };
        assert_eq!(tool.description_or_empty(), "");
    }
}
