//! Backend error kinds

use thiserror::Error;

/// Failure talking to a completion backend
///
/// The router treats every variant except `Cancelled` as a dispatch failure
/// eligible for the fallback retry.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport, auth or protocol failure reported by the backend
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// The stream stopped before the backend signalled its end
    #[error("Stream ended unexpectedly")]
    StreamEnded,

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
