//! Domain-level error types for slack-history-export.
//!
//! All errors are typed with `thiserror`. Remote rejections and transport
//! failures are kept apart so callers can pick a fail-soft or fail-fast
//! policy per call site.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The Slack Web API explicitly rejected a call (auth, scope, rate limit).
    #[error("Slack API {method} failed: {code}")]
    Api { method: String, code: String },

    /// Network-level failure (timeout, connection reset, bad status on download).
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Invalid or unexpected data in a response.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create an API rejection error.
    pub fn api(method: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            code: code.into(),
        }
    }

    /// Create a transport error from a reqwest error.
    pub fn transport(message: impl Into<String>, err: reqwest::Error) -> Self {
        Self::Transport {
            message: format!("{}: {err}", message.into()),
            source: Some(err),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Whether the remote side rejected the call because of rate limiting.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "ratelimited")
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = AppError::api("conversations.history", "channel_not_found");
        assert_eq!(
            err.to_string(),
            "Slack API conversations.history failed: channel_not_found"
        );
    }

    #[test]
    fn test_rate_limited_detection() {
        assert!(AppError::api("users.list", "ratelimited").is_rate_limited());
        assert!(!AppError::api("users.list", "invalid_auth").is_rate_limited());
        assert!(!AppError::Config {
            message: "ratelimited".into()
        }
        .is_rate_limited());
    }
}
