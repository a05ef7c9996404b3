//! Canonical form of a tool call result.

use rmcp::model::CallToolResult;
use serde::{Deserialize, Serialize};

/// Raw tool response as shown to the user and fed to the token analyzer.
///
/// Error results (`isError: true`) are kept as responses rather than turned
/// into errors, since their payload still costs tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<serde_json::Value>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn new(content: Vec<serde_json::Value>, is_error: bool) -> Self {
        Self { content, is_error }
    }

    /// Single text content item, as most servers return.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(
            vec![serde_json::json!({ "type": "text", "text": text.into() })],
            false,
        )
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

impl From<CallToolResult> for ToolResponse {
    fn from(result: CallToolResult) -> Self {
        let content = result
            .content
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect();
        Self {
            content,
            is_error: result.is_error.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_results_are_kept() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "tool failed at runtime" }
            ],
            "isError": true
        }))
        .expect("fixture call result should deserialize");

        let response = ToolResponse::from(result);
        assert!(response.is_error);
        assert_eq!(response.content[0]["text"], "tool failed at runtime");
    }

    #[test]
    fn missing_is_error_defaults_to_false() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "ok" }]
        }))
        .expect("fixture call result should deserialize");

        let response = ToolResponse::from(result);
        assert!(!response.is_error);
        assert!(response.to_pretty_json().contains("\"isError\": false"));
    }

    #[test]
    fn pretty_json_uses_wire_field_names() {
        let rendered = ToolResponse::text("hello").to_pretty_json();
        assert!(rendered.contains("\"isError\": false"));
        assert!(rendered.contains("\"text\": \"hello\""));
        assert!(rendered.starts_with("{\n  \"content\""));
    }
}
