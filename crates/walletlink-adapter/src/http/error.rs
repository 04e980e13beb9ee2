/*
[INPUT]:  Error sources (HTTP, API, serialization, provider, configuration)
[OUTPUT]: Structured error types with retry and auth hints
[POS]:    Error handling layer - unified error type for the adapter crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::provider::ProviderError;

/// Main error type for the wallet adapter
#[derive(Error, Debug)]
pub enum LinkError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Sign-in was refused
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Wallet provider raised an error
    #[error("Wallet provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request timed out
    #[error("Request timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl LinkError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::Http(err) => err.is_timeout() || err.is_connect(),
            LinkError::Timeout { .. } | LinkError::InvalidResponse(_) => true,
            LinkError::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Check if error indicates the sign-in itself was refused
    pub fn is_auth_error(&self) -> bool {
        match self {
            LinkError::Authentication { .. } => true,
            LinkError::Api { code, .. } => *code == 401 || *code == 403,
            LinkError::Provider(err) => err.is_user_rejection(),
            _ => false,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        LinkError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, LinkError>;
