//! Error types for the token tester.

use thiserror::Error;

/// Primary error type for all tester operations.
#[derive(Error, Debug)]
pub enum TesterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Server '{0}' not found")]
    ServerNotFound(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Not connected to server")]
    NotConnected,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {context}: {message}")]
    Protocol { context: String, message: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Unknown configuration key: {0}")]
    UnknownSetting(String),
}

impl TesterError {
    /// Create an API error from a status code and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a protocol error tagged with the operation that failed.
    pub fn protocol(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from talking to a remote service rather than
    /// from local input or configuration.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Api { .. }
                | Self::Network(_)
                | Self::Authentication(_)
                | Self::Connection(_)
                | Self::Protocol { .. }
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TesterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_setting_message_names_key() {
        let err = TesterError::InvalidSetting {
            key: "overhead".into(),
            reason: "must be an integer".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for overhead: must be an integer"
        );
    }

    #[test]
    fn remote_errors_are_classified() {
        assert!(TesterError::api(500, "boom").is_remote());
        assert!(TesterError::protocol("call_tool", "closed").is_remote());
        assert!(!TesterError::NotConnected.is_remote());
        assert!(!TesterError::InvalidArgument("bad".into()).is_remote());
    }
}
