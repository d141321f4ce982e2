//! Backend provider implementations
//!
//! A provider turns an ordered message list into a stream of fragments.
//!
//! ## Architecture
//!
//! HTTP backends go through the `genai` crate, which handles:
//! - Streaming SSE parsing
//! - Provider-specific protocols (OpenAI, Anthropic, Ollama, etc.)
//! - Tool calling
//!
//! OpenAI-compatible servers that genai does not know by name (LM Studio,
//! Perplexity) are reached through genai's `ServiceTargetResolver` by
//! setting `api_base` on the backend.
//!
//! The `MockProvider` is kept for testing purposes.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;

// Core traits and types
pub use traits::{Completion, Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
pub use error::{ProviderError, ProviderResult};

// HTTP backends via genai
pub use genai_provider::GenaiProvider;
pub use genai_adapter::GenaiTarget;

// Mock provider for testing
pub use mock::{MockConfig, MockMode, MockProvider, RecordedRequest};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` yields an echoing `MockProvider`; everything else is served by
/// `GenaiProvider`, which falls back to the OpenAI protocol for unknown ids.
pub fn create_provider(provider_id: &str, logger: Arc<dyn Logger>) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => Arc::new(GenaiProvider::new(provider_id, logger)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_create_provider() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        assert_eq!(create_provider("mock", Arc::clone(&logger)).name(), "mock");
        assert_eq!(create_provider("Mock", Arc::clone(&logger)).name(), "mock");
        assert_eq!(create_provider("perplexity", Arc::clone(&logger)).name(), "perplexity");
        assert_eq!(create_provider("openai", logger).name(), "openai");
    }
}
