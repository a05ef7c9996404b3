//! Token counting and tool-call cost analysis.

pub mod anthropic;
pub mod models;

use async_trait::async_trait;
use serde::Serialize;

use crate::mcp::ToolResponse;

pub use anthropic::AnthropicTokenCounter;
pub use models::{create_counter, resolve_model};

/// Counts tokens for a piece of text. Never fails: implementations fall back
/// to [`estimate_tokens`] when they cannot get an exact count.
#[async_trait]
pub trait TokenCounter: Send + Sync {
    async fn count_tokens(&self, text: &str) -> u64;
}

/// Rough token estimate: 1.3 tokens per whitespace-separated word, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count() as u64;
    (words * 13).div_ceil(10)
}

/// Counter that only uses the word-count estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountCounter;

#[async_trait]
impl TokenCounter for WordCountCounter {
    async fn count_tokens(&self, text: &str) -> u64 {
        estimate_tokens(text)
    }
}

/// Token cost of one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenAnalysis {
    /// Request tokens, overhead included.
    pub input_tokens: u64,
    pub response_tokens: u64,
    pub overhead_tokens: u64,
    pub total_tokens: u64,
}

impl TokenAnalysis {
    /// Human-readable block headed by the provider and model counted against.
    pub fn report(&self, provider: &str, model: &str) -> String {
        format!(
            "--- Token Analysis ({provider} {model}) ---\n\
             Input tokens (estimated): {}\n\
             Response tokens (actual): {}\n\
             Total tokens: {}\n\
             Overhead tokens: {}",
            self.input_tokens, self.response_tokens, self.total_tokens, self.overhead_tokens
        )
    }
}

/// Applies a [`TokenCounter`] to a tool request and its response.
pub struct TokenAnalyzer {
    counter: Box<dyn TokenCounter>,
    overhead_tokens: u64,
}

impl TokenAnalyzer {
    pub fn new(counter: Box<dyn TokenCounter>, overhead_tokens: u64) -> Self {
        Self {
            counter,
            overhead_tokens,
        }
    }

    pub fn overhead(&self) -> u64 {
        self.overhead_tokens
    }

    pub fn set_overhead(&mut self, overhead_tokens: u64) {
        self.overhead_tokens = overhead_tokens;
    }

    pub async fn analyze_tool_call(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
        response: &ToolResponse,
    ) -> TokenAnalysis {
        let input_text = request_text(tool_name, arguments);
        let response_text = response.to_pretty_json();

        let input_tokens = self.counter.count_tokens(&input_text).await + self.overhead_tokens;
        let response_tokens = self.counter.count_tokens(&response_text).await;

        TokenAnalysis {
            input_tokens,
            response_tokens,
            overhead_tokens: self.overhead_tokens,
            total_tokens: input_tokens + response_tokens,
        }
    }
}

fn request_text(tool_name: &str, arguments: &serde_json::Value) -> String {
    let arguments =
        serde_json::to_string_pretty(arguments).unwrap_or_else(|_| arguments.to_string());
    format!("Tool: {tool_name}\nArguments: {arguments}")
}
