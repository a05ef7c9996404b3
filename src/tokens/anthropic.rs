//! Anthropic count-tokens API counter.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{estimate_tokens, TokenCounter};
use crate::error::Result;
use crate::provider::http::{
    anthropic_headers, shared_client, status_to_error, ANTHROPIC_API_BASE, ANTHROPIC_VERSION,
};

#[derive(Debug, Deserialize)]
struct CountTokensResponse {
    input_tokens: u64,
}

/// Counts tokens with `POST /v1/messages/count_tokens`, falling back to the
/// word-count estimate without a key or on any failure.
pub struct AnthropicTokenCounter {
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicTokenCounter {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the API for an exact count. Errors are returned, not estimated.
    pub async fn try_count_tokens(&self, api_key: &str, text: &str) -> Result<u64> {
        let url = format!("{}/v1/messages/count_tokens", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": text }],
        });

        debug!(model = %self.model, "Anthropic count_tokens");

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(api_key, ANTHROPIC_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: CountTokensResponse = resp.json().await?;
        Ok(data.input_tokens)
    }
}

#[async_trait]
impl TokenCounter for AnthropicTokenCounter {
    async fn count_tokens(&self, text: &str) -> u64 {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("ANTHROPIC_API_KEY not set, using word-count estimate");
            return estimate_tokens(text);
        };

        match self.try_count_tokens(api_key, text).await {
            Ok(tokens) => tokens,
            Err(error) => {
                warn!(
                    model = %self.model,
                    error = %error,
                    "token counting failed, using word-count estimate (tip: check ANTHROPIC_API_KEY)"
                );
                estimate_tokens(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn exact_count_comes_from_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages/count_tokens"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-5-haiku-20241022",
                "messages": [{ "role": "user", "content": "hello there" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "input_tokens": 42 })))
            .expect(1)
            .mount(&server)
            .await;

        let counter =
            AnthropicTokenCounter::new("claude-3-5-haiku-20241022", Some("sk-test".into()))
                .with_base_url(format!("{}/", server.uri()));
        assert_eq!(counter.count_tokens("hello there").await, 42);
    }

    #[tokio::test]
    async fn api_failure_falls_back_to_estimate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages/count_tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": { "type": "authentication_error", "message": "invalid x-api-key" }
            })))
            .mount(&server)
            .await;

        let counter = AnthropicTokenCounter::new("claude-3-5-sonnet-20241022", Some("bad".into()))
            .with_base_url(server.uri());

        let err = counter
            .try_count_tokens("bad", "one two three")
            .await
            .expect_err("401 should surface as an error");
        assert!(matches!(err, crate::error::TesterError::Authentication(_)));
        assert_eq!(counter.count_tokens("one two three").await, 4);
    }

    #[tokio::test]
    async fn missing_key_never_calls_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "input_tokens": 1 })))
            .expect(0)
            .mount(&server)
            .await;

        let counter =
            AnthropicTokenCounter::new("claude-3-5-sonnet-20241022", None).with_base_url(server.uri());
        assert_eq!(counter.count_tokens("a b c d e f g h i j").await, 13);
    }
}
