//! Mock provider for testing
//!
//! Provides deterministic, configurable responses without network dependencies.
//! Every request is recorded so tests can inspect exactly what a strategy or the
//! classifier sent upstream.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
use crate::log_debug;
use crate::logging::Logger;
use crate::types::{
    CancellationToken, ChatMessage, MessageRole, StreamChunk, ToolCall,
};

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Return response as specific chunks
    Chunks(Vec<String>),
    /// Fail mid-stream after `delay_chunks` text chunks
    Error { message: String, delay_chunks: usize },
    /// Return nothing (empty response)
    Empty,
    /// Answer with a single tool call naming this tool
    ToolCall(String),
    /// Refuse the request before any stream is opened
    Unavailable(String),
}

/// Configuration for the mock provider
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay between chunks in milliseconds (0 = no delay)
    pub chunk_delay_ms: u64,
    /// Size of each chunk when splitting fixed/echo responses
    pub chunk_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            chunk_delay_ms: 0,
            chunk_size: 10,
        }
    }
}

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: Option<u32>,
    /// Names of the tools offered with the request, in order
    pub tool_names: Vec<String>,
}

enum MockStep {
    Text(String),
    Call(ToolCall),
    Fail(String),
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: MockConfig,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider with default config
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode,
                ..Default::default()
            },
            logger,
        )
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a chunked response provider
    pub fn chunked(chunks: Vec<String>, delay_ms: u64, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Chunks(chunks), logger).with_delay(delay_ms)
    }

    /// Create a provider whose stream fails on the first chunk
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(
            MockMode::Error {
                message: message.into(),
                delay_chunks: 0,
            },
            logger,
        )
    }

    /// Create a provider that selects `tool_name` through a tool call
    pub fn tool_call(tool_name: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::ToolCall(tool_name.into()), logger)
    }

    /// Create a provider that rejects every request up front
    pub fn unavailable(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Unavailable(message.into()), logger)
    }

    /// Set chunk delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.chunk_delay_ms = delay_ms;
        self
    }

    /// Set chunk size for splitting responses
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Extract last user message content
    fn get_last_user_message(&self, messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    /// Split text into chunks
    fn split_into_chunks(&self, text: &str) -> Vec<String> {
        if self.config.chunk_size == 0 || text.is_empty() {
            return vec![text.to_string()];
        }

        text.chars()
            .collect::<Vec<_>>()
            .chunks(self.config.chunk_size)
            .map(|c| c.iter().collect())
            .collect()
    }

    fn texts(chunks: Vec<String>) -> Vec<MockStep> {
        chunks.into_iter().map(MockStep::Text).collect()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:0/mock"
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        self.logger.debug("MockProvider: stream_chat called");

        self.requests.lock().push(RecordedRequest {
            messages: messages.clone(),
            model: model.model.clone(),
            max_tokens: options.max_tokens,
            tool_names: options
                .tools
                .as_ref()
                .map(|tools| tools.iter().map(|t| t.name.clone()).collect())
                .unwrap_or_default(),
        });

        let steps: Vec<MockStep> = match &self.config.mode {
            MockMode::Echo => {
                let user_msg = self.get_last_user_message(&messages);
                log_debug!(self.logger, "MockProvider: Echo mode, echoing: {}", user_msg);
                Self::texts(self.split_into_chunks(&format!("Echo: {}", user_msg)))
            }
            MockMode::Fixed(response) => {
                log_debug!(self.logger, "MockProvider: Fixed mode, response len: {}", response.len());
                Self::texts(self.split_into_chunks(response))
            }
            MockMode::Chunks(chunks) => {
                log_debug!(self.logger, "MockProvider: Chunks mode, {} chunks", chunks.len());
                Self::texts(chunks.clone())
            }
            MockMode::Empty => {
                self.logger.debug("MockProvider: Empty mode");
                vec![]
            }
            MockMode::ToolCall(name) => {
                log_debug!(self.logger, "MockProvider: ToolCall mode, selecting {}", name);
                let text = self.get_last_user_message(&messages);
                vec![MockStep::Call(ToolCall::new(
                    "mock_call_0",
                    name.clone(),
                    json!({ "text": text }),
                ))]
            }
            MockMode::Error { message, delay_chunks } => {
                log_debug!(self.logger, "MockProvider: Error mode after {} chunks", delay_chunks);
                let mut steps: Vec<MockStep> = (0..*delay_chunks)
                    .map(|i| MockStep::Text(format!("Chunk {} before error. ", i)))
                    .collect();
                steps.push(MockStep::Fail(message.clone()));
                steps
            }
            MockMode::Unavailable(message) => {
                self.logger.debug("MockProvider: Unavailable mode");
                return Err(ProviderError::api_error("mock", 503, message.clone()));
            }
        };

        let delay_ms = self.config.chunk_delay_ms;
        let logger = self.logger.clone();

        let stream = stream::iter(steps.into_iter().enumerate())
            .then(move |(i, step)| {
                let logger = logger.clone();
                let cancel = cancel_token.clone();
                async move {
                    if cancel.is_cancelled() {
                        return Err(ProviderError::Cancelled);
                    }

                    // Apply delay (except for first chunk)
                    if i > 0 && delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }

                    match step {
                        MockStep::Text(text) => {
                            log_debug!(logger, "MockProvider: Yielding chunk {}: '{}'", i, text);
                            Ok(StreamChunk::Text { text })
                        }
                        MockStep::Call(tool_call) => Ok(StreamChunk::ToolCall { tool_call }),
                        MockStep::Fail(msg) => Err(ProviderError::Other(format!("Mock error: {}", msg))),
                    }
                }
            });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ToolSchema;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn test_messages(content: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(content)]
    }

    fn test_config() -> ProviderModelConfig {
        ProviderModelConfig::new("mock-model")
    }

    async fn drain(provider: &MockProvider, cancel: CancellationToken) -> Vec<ProviderResult<StreamChunk>> {
        let stream = provider
            .stream_chat(test_messages("Anything"), test_config(), StreamChatOptions::default(), cancel)
            .await
            .expect("stream should start");
        stream.collect().await
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(test_logger());
        let completion = provider
            .complete(test_messages("Hello, world!"), test_config(), StreamChatOptions::default(), CancellationToken::new())
            .await
            .expect("completion should succeed");

        assert_eq!(completion.text, "Echo: Hello, world!");
    }

    #[tokio::test]
    async fn test_fixed_mode() {
        let provider = MockProvider::fixed("This is a test response.", test_logger());
        let chunks = drain(&provider, CancellationToken::new()).await;

        let text: String = chunks
            .into_iter()
            .filter_map(|c| c.expect("chunk should succeed").into_text())
            .collect();
        assert_eq!(text, "This is a test response.");
    }

    #[tokio::test]
    async fn test_chunked_mode() {
        let chunks = vec!["First ".to_string(), "second ".to_string(), "third.".to_string()];
        let provider = MockProvider::chunked(chunks.clone(), 0, test_logger());

        let received: Vec<String> = drain(&provider, CancellationToken::new())
            .await
            .into_iter()
            .filter_map(|c| c.expect("chunk should succeed").into_text())
            .collect();

        assert_eq!(received, chunks);
    }

    #[tokio::test]
    async fn test_error_mode() {
        let provider = MockProvider::error("Test error message", test_logger());
        let chunks = drain(&provider, CancellationToken::new()).await;

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_err());
    }

    #[tokio::test]
    async fn test_unavailable_mode_fails_before_streaming() {
        let provider = MockProvider::unavailable("backend down", test_logger());
        let result = provider
            .stream_chat(test_messages("hi"), test_config(), StreamChatOptions::default(), CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ProviderError::ApiError { status: 503, .. })));
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_call_mode() {
        let provider = MockProvider::tool_call("therapist", test_logger());
        let completion = provider
            .complete(test_messages("I feel anxious"), test_config(), StreamChatOptions::default(), CancellationToken::new())
            .await
            .unwrap();

        assert!(completion.text.is_empty());
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].name, "therapist");
        assert_eq!(completion.tool_calls[0].input["text"], "I feel anxious");
    }

    #[tokio::test]
    async fn test_cancellation_stops_stream() {
        let provider = MockProvider::fixed("Long response that should be cancelled", test_logger())
            .with_chunk_size(4);
        let cancel = CancellationToken::new();

        let mut stream = provider
            .stream_chat(test_messages("Anything"), test_config(), StreamChatOptions::default(), cancel.clone())
            .await
            .expect("stream should start");

        assert!(stream.next().await.unwrap().is_ok());
        cancel.cancel();

        let next = stream.next().await.expect("stream should report cancellation");
        assert!(matches!(next, Err(ProviderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let provider = MockProvider::echo(test_logger());
        let options = StreamChatOptions::new()
            .with_max_tokens(1024)
            .with_tools(vec![ToolSchema::new("ideation", "Brainstorm")]);

        provider
            .complete(test_messages("first"), test_config(), options, CancellationToken::new())
            .await
            .unwrap();

        let request = provider.last_request().expect("request recorded");
        assert_eq!(request.model, "mock-model");
        assert_eq!(request.max_tokens, Some(1024));
        assert_eq!(request.tool_names, vec!["ideation".to_string()]);
        assert_eq!(request.messages, test_messages("first"));
    }

    #[test]
    fn test_provider_name() {
        let provider = MockProvider::new(test_logger());
        assert_eq!(provider.name(), "mock");
        assert_eq!(provider.get_api_base(&test_config()), "http://localhost:0/mock");
    }

    #[test]
    fn test_chunk_splitting() {
        let provider = MockProvider::new(test_logger()).with_chunk_size(5);
        let chunks = provider.split_into_chunks("Hello, world!");

        assert_eq!(chunks, vec!["Hello", ", wor", "ld!"]);
    }
}
