//! Credentials and defaults for the token counting API, read from the
//! environment (after loading `.env` if present).

use std::fmt;

/// Model used for token counting when `ANTHROPIC_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Provider used for token counting when none is given.
pub const DEFAULT_PROVIDER: &str = "anthropic";

const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
const MODEL_VAR: &str = "ANTHROPIC_MODEL";
const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

/// Token-counting credentials and endpoint overrides.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Credentials {
    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            api_key: read(API_KEY_VAR),
            model: read(MODEL_VAR),
            base_url: read(BASE_URL_VAR),
        }
    }

    /// Model to count against when the caller does not pick one.
    pub fn default_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// API key for a provider, if one is configured.
    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        if provider.eq_ignore_ascii_case(DEFAULT_PROVIDER) {
            self.api_key.as_deref()
        } else {
            None
        }
    }
}
