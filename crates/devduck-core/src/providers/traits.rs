//! The seam between the router and completion backends

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use super::error::ProviderResult;
use crate::types::{CancellationToken, ChatMessage, StreamChunk, ToolCall, ToolChoice, ToolSchema};

/// Where and as whom one request is sent
///
/// Built per request by `ClientHandle::model_config` from the backend's
/// configuration and resolved credential.
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    pub model: String,
    pub api_key: Option<String>,
    /// Overrides the provider's default endpoint (LM Studio, Perplexity, ...)
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Sampling and tool settings for one request; unset fields use the backend's defaults
#[derive(Debug, Clone, Default)]
pub struct StreamChatOptions {
    pub temperature: Option<f32>,
    /// Search answers are capped here
    pub max_tokens: Option<u32>,
    /// The classifier offers the capability list as tools
    pub tools: Option<Vec<ToolSchema>>,
    pub tool_choice: Option<ToolChoice>,
}

impl StreamChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}

/// A response read to its end
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    /// In the order the backend reported them
    pub tool_calls: Vec<ToolCall>,
}

pub type StreamResponse = Pin<Box<dyn Stream<Item = ProviderResult<StreamChunk>> + Send>>;

/// A completion backend protocol
///
/// `GenaiProvider` speaks to real servers, `MockProvider` stands in for them
/// in tests. Implementations check the cancellation token between chunks.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Adapter id, e.g. "openai" or "mock"
    fn name(&self) -> &str;

    /// Endpoint used when the model config names none
    fn default_api_base(&self) -> &str;

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse>;

    /// Read `stream_chat` to the end
    ///
    /// Text is concatenated; argument deltas are skipped since the finished
    /// calls are reported separately.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        let mut stream = self.stream_chat(messages, model, options, cancel_token).await?;
        let mut completion = Completion::default();
        while let Some(chunk) = stream.next().await {
            match chunk? {
                StreamChunk::Text { text } => completion.text.push_str(&text),
                StreamChunk::ToolCall { tool_call } => completion.tool_calls.push(tool_call),
                StreamChunk::ToolCallDelta { .. } => {}
            }
        }
        Ok(completion)
    }

    fn get_api_base(&self, model: &ProviderModelConfig) -> String {
        model
            .api_base
            .clone()
            .unwrap_or_else(|| self.default_api_base().to_string())
    }
}
