//! Error types for the Scarlet login SDK.

use thiserror::Error;

/// Normalized errors surfaced by every SDK operation.
///
/// Validation failures (`InvalidParams`, `AgentUnavailable`,
/// `AuthorizationFailed` from state checks) are detected locally and never
/// reach the network. Gateway failures pass through unchanged in kind; the
/// SDK performs no automatic retries.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Authorization agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Refresh token missing or expired; re-authorization required")]
    TokenExpired,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
        description: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;
