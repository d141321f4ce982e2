//! GenaiProvider - HTTP backends through the genai crate
//!
//! Handles genai-native providers (OpenAI, Anthropic, Ollama, ...) and any
//! OpenAI-compatible server reachable at a custom `api_base` (LM Studio,
//! Perplexity, ...).

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use genai::chat::{ChatRequest, ChatStreamEvent};

use crate::{log_debug, log_error, log_info};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_event, to_genai_messages, to_genai_options, to_genai_tools,
    GenaiTarget,
};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};

/// Provider using genai for all supported completion APIs
pub struct GenaiProvider {
    /// Provider adapter identifier
    provider_id: String,
    /// Logger for debug output
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    /// Create a new GenaiProvider
    pub fn new(provider_id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            logger,
        }
    }

    /// Map a genai error onto our error kinds
    fn map_error(&self, err: genai::Error) -> ProviderError {
        let message = err.to_string();
        if message.contains("429") || message.to_lowercase().contains("rate limit") {
            ProviderError::rate_limited(&self.provider_id, message)
        } else {
            ProviderError::api_error(&self.provider_id, 500, message)
        }
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    fn default_api_base(&self) -> &str {
        match self.provider_id.as_str() {
            "openai" => "https://api.openai.com/v1/",
            "anthropic" => "https://api.anthropic.com/",
            "gemini" => "https://generativelanguage.googleapis.com/",
            "ollama" => "http://localhost:11434/",
            "groq" => "https://api.groq.com/openai/v1/",
            "xai" => "https://api.x.ai/v1/",
            "deepseek" => "https://api.deepseek.com/",
            "cohere" => "https://api.cohere.ai/",
            "fireworks" => "https://api.fireworks.ai/inference/v1/",
            "together" => "https://api.together.xyz/v1/",
            _ => "https://api.openai.com/v1/",
        }
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        log_info!(
            self.logger,
            "[GenaiProvider] stream_chat called: provider={}, model={}, base={}",
            self.provider_id,
            model_config.model,
            self.get_api_base(&model_config)
        );

        let client = create_client(&GenaiTarget::new(&self.provider_id, &model_config));

        let mut chat_req = ChatRequest::new(to_genai_messages(messages));
        if let Some(tools) = &options.tools {
            chat_req = chat_req.with_tools(to_genai_tools(tools.clone()));
        }
        let genai_options = to_genai_options(&options);

        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let chat_stream = client
            .exec_chat_stream(&model_config.model, chat_req, Some(&genai_options))
            .await
            .map_err(|e| self.map_error(e))?;

        self.logger.info("[GenaiProvider] Stream started successfully");

        let cancel = cancel_token.clone();
        let logger = Arc::clone(&self.logger);
        let provider_id = self.provider_id.clone();

        let stream = chat_stream.stream.filter_map(move |result| {
            let cancel = cancel.clone();
            let logger = Arc::clone(&logger);
            let provider_id = provider_id.clone();

            async move {
                if cancel.is_cancelled() {
                    logger.info("[GenaiProvider] Stream cancelled");
                    return Some(Err(ProviderError::Cancelled));
                }

                match result {
                    Ok(event) => {
                        match &event {
                            ChatStreamEvent::Start => {
                                logger.debug("[GenaiProvider] Stream event: Start");
                            }
                            ChatStreamEvent::Chunk(c) => {
                                log_debug!(
                                    logger,
                                    "[GenaiProvider] Stream event: Chunk ({} chars)",
                                    c.content.len()
                                );
                            }
                            ChatStreamEvent::End(_) => {
                                logger.info("[GenaiProvider] Stream event: End");
                            }
                            _ => {}
                        }
                        from_genai_event(event)
                    }
                    Err(e) => {
                        log_error!(logger, "[GenaiProvider] Stream error: {}", e);
                        Some(Err(ProviderError::ApiError {
                            status: 500,
                            message: e.to_string(),
                            provider: provider_id,
                        }))
                    }
                }
            }
        });

        // Stop polling upstream once cancellation has been reported
        let stream = stream.scan(false, |stopped, item| {
            let out = if *stopped {
                None
            } else {
                if matches!(item, Err(ProviderError::Cancelled)) {
                    *stopped = true;
                }
                Some(item)
            };
            futures::future::ready(out)
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_default_api_bases() {
        let provider = GenaiProvider::new("ollama", Arc::new(NoOpLogger));
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.default_api_base(), "http://localhost:11434/");

        let provider = GenaiProvider::new("perplexity", Arc::new(NoOpLogger));
        assert_eq!(provider.default_api_base(), "https://api.openai.com/v1/");
    }

    #[test]
    fn test_custom_api_base_wins() {
        let provider = GenaiProvider::new("openai", Arc::new(NoOpLogger));
        let model = ProviderModelConfig::new("llama-3.2-3b-instruct")
            .with_api_base("http://localhost:1234/v1");
        assert_eq!(provider.get_api_base(&model), "http://localhost:1234/v1");

        let model = ProviderModelConfig::new("gpt-4o");
        assert_eq!(provider.get_api_base(&model), "https://api.openai.com/v1/");
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let provider = GenaiProvider::new("openai", Arc::new(NoOpLogger));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = provider
            .stream_chat(
                vec![ChatMessage::user("hi")],
                ProviderModelConfig::new("gpt-4o").with_api_base("http://127.0.0.1:9/v1"),
                StreamChatOptions::default(),
                cancel,
            )
            .await;
        assert!(matches!(result, Err(ProviderError::Cancelled)));
    }
}
