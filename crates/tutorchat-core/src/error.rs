//! Error types for the tutorchat client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire tutorchat client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatClientError {
    /// The service answered with a non-success status. `message` carries the
    /// body's `error` field when present, otherwise a generic fallback.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level failure (connect, timeout, broken transfer)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A selected file was rejected before upload. The message is the
    /// user-facing alert text.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatClientError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Api error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidImage error
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an Api error
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Check if this is a Network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this is an InvalidImage error
    pub fn is_invalid_image(&self) -> bool {
        matches!(self, Self::InvalidImage(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ChatClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ChatClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ChatClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChatClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ChatClientError>`.
pub type Result<T> = std::result::Result<T, ChatClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ChatClientError::api(500, "oops");
        assert_eq!(err.to_string(), "API error (status 500): oops");
        assert!(err.is_api());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ChatClientError = io.into();
        assert!(matches!(err, ChatClientError::Io { .. }));
    }

    #[test]
    fn test_from_json_error() {
        let parse = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ChatClientError = parse.into();
        assert!(matches!(
            err,
            ChatClientError::Serialization { ref format, .. } if format == "JSON"
        ));
    }
}
