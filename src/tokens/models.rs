//! Model aliases and counter selection.

use super::{AnthropicTokenCounter, TokenCounter};
use crate::config::env::{Credentials, DEFAULT_PROVIDER};
use crate::error::{Result, TesterError};

/// Friendly model names and the API identifiers they stand for.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-opus-4", "claude-opus-4-20250514"),
    ("claude-sonnet-4", "claude-sonnet-4-20250514"),
    ("claude-sonnet-3.7", "claude-3-7-sonnet-20250219"),
    ("claude-sonnet-3.5", "claude-3-5-sonnet-20241022"),
    ("claude-haiku-3.5", "claude-3-5-haiku-20241022"),
    ("claude-haiku-3", "claude-3-haiku-20240307"),
    ("claude-opus-3", "claude-3-opus-20240229"),
];

/// Map a friendly name to its API identifier. Aliases and known identifiers
/// match regardless of case; unknown names pass through unchanged.
pub fn resolve_model(model: &str) -> String {
    MODEL_ALIASES
        .iter()
        .find_map(|(alias, id)| {
            (alias.eq_ignore_ascii_case(model) || id.eq_ignore_ascii_case(model)).then_some(*id)
        })
        .map_or_else(|| model.to_string(), str::to_string)
}

/// Build the counter for a provider. Only `anthropic` is supported.
pub fn create_counter(
    provider: &str,
    model: &str,
    credentials: &Credentials,
) -> Result<Box<dyn TokenCounter>> {
    if !provider.eq_ignore_ascii_case(DEFAULT_PROVIDER) {
        return Err(TesterError::UnsupportedProvider(provider.to_string()));
    }

    let mut counter = AnthropicTokenCounter::new(
        resolve_model(model),
        credentials.api_key_for(provider).map(str::to_string),
    );
    if let Some(base_url) = credentials.base_url.as_deref() {
        counter = counter.with_base_url(base_url);
    }
    Ok(Box::new(counter))
}
