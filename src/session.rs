//! Interactive session configuration.

use crate::config::env::{Credentials, DEFAULT_PROVIDER};
use crate::error::{Result, TesterError};

/// Keys accepted by `set`, in display order.
pub const SETTING_KEYS: [&str; 4] = ["provider", "model", "overhead", "auto_tokens"];

/// Mutable settings for one interactive session. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub provider: String,
    pub model: String,
    pub overhead: u64,
    pub auto_tokens: bool,
}

impl SessionSettings {
    pub fn new(credentials: &Credentials, overhead: u64) -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: credentials.default_model().to_string(),
            overhead,
            auto_tokens: false,
        }
    }

    /// Coerce `value` for `key` and store it. Returns the stored value as
    /// displayed back to the user.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<String> {
        match key {
            "provider" => {
                self.provider = value.to_string();
                Ok(self.provider.clone())
            }
            "model" => {
                self.model = value.to_string();
                Ok(self.model.clone())
            }
            "overhead" => {
                self.overhead = value.trim().parse().map_err(|_| TesterError::InvalidSetting {
                    key: key.to_string(),
                    reason: "must be an integer".into(),
                })?;
                Ok(self.overhead.to_string())
            }
            "auto_tokens" => {
                self.auto_tokens = parse_bool(value).ok_or_else(|| TesterError::InvalidSetting {
                    key: key.to_string(),
                    reason: "use 'on' or 'off'".into(),
                })?;
                Ok(on_off(self.auto_tokens).to_string())
            }
            other => Err(TesterError::UnknownSetting(other.to_string())),
        }
    }

    /// Current values keyed as in [`SETTING_KEYS`].
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("provider", self.provider.clone()),
            ("model", self.model.clone()),
            ("overhead", self.overhead.to_string()),
            ("auto_tokens", on_off(self.auto_tokens).to_string()),
        ]
    }
}

/// `on/off/true/false/1/0`, ignoring case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
