//! Router-level errors

use thiserror::Error;

use crate::providers::ProviderError;

/// Errors surfaced by `ClientManager`, `ToolRegistry` and `Router`
#[derive(Error, Debug)]
pub enum RouterError {
    /// No backend is registered under this name
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// No tool is registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Transport, auth, rate-limit or malformed response from a backend
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The classifier answered without a usable tool name
    #[error("Classification returned no usable tool name: {0}")]
    ClassificationAmbiguous(String),

    /// Another exchange is still in flight on this session
    #[error("Session {0} already has an exchange in flight")]
    SessionBusy(String),

    /// `commit` was called before the fragment stream completed cleanly
    #[error("Exchange has not completed; nothing to commit")]
    IncompleteExchange,

    /// The ideation retry after a failed dispatch failed as well
    #[error("Fallback to {tool} failed: {source}")]
    FallbackFailed {
        tool: String,
        #[source]
        source: Box<RouterError>,
    },
}

impl RouterError {
    /// Build a `FallbackFailed` wrapping the retry's error
    pub fn fallback_failed(tool: impl Into<String>, source: RouterError) -> Self {
        Self::FallbackFailed {
            tool: tool.into(),
            source: Box::new(source),
        }
    }

    /// Whether the underlying cause was a caller cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            RouterError::Provider(e) => e.is_cancelled(),
            RouterError::FallbackFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RouterError::UnknownBackend("gpu".into()).to_string(), "Unknown backend: gpu");
        assert_eq!(RouterError::UnknownTool("nonexistent_tool".into()).to_string(), "Unknown tool: nonexistent_tool");

        let err: RouterError = ProviderError::api_error("local", 503, "down").into();
        assert_eq!(err.to_string(), "local API error (503): down");
    }

    #[test]
    fn test_fallback_failed_keeps_source() {
        let inner = RouterError::from(ProviderError::Cancelled);
        let err = RouterError::fallback_failed("ideation", inner);
        assert!(err.to_string().starts_with("Fallback to ideation failed"));
        assert!(err.is_cancelled());
        assert!(std::error::Error::source(&err).is_some());
    }
}
