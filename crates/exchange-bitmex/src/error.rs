//! Error types for BitMEX exchange integration.
//!
//! These cover the transport layer only. Application-level errors (an
//! `error` field inside an otherwise well-formed JSON response) are not
//! errors at this layer; the client surfaces them as data through
//! [`crate::client::ApiResponse`].

use thiserror::Error;

/// Errors that can occur when talking to BitMEX.
#[derive(Debug, Error)]
pub enum BitmexError {
    /// HMAC signing error.
    #[error("signing error: {0}")]
    Signing(String),

    /// Non-success HTTP status without a parseable API error payload.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BitmexError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BitmexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BitmexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for BitMEX operations.
pub type Result<T> = std::result::Result<T, BitmexError>;
