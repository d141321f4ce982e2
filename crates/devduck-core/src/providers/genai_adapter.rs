//! Adapter between devduck-core types and genai types
//!
//! Conversion functions between our types and genai's types, plus client
//! construction. Credentials are resolved by the `ClientManager` before a
//! request is made and handed to genai explicitly; genai's own env var lookup
//! is never consulted.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRole as GenaiRole,
    ChatStreamEvent, MessageContent as GenaiContent, Tool as GenaiTool,
    ToolCall as GenaiToolCall,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};

use crate::types::{ChatMessage, MessageRole, StreamChunk, ToolCall, ToolSchema};

use super::error::ProviderError;
use super::traits::{ProviderModelConfig, StreamChatOptions};

// ============================================================================
// Message Conversion: devduck -> genai
// ============================================================================

/// Convert a MessageRole to genai ChatRole
pub fn to_genai_role(role: MessageRole) -> GenaiRole {
    match role {
        MessageRole::System => GenaiRole::System,
        MessageRole::User => GenaiRole::User,
        MessageRole::Assistant => GenaiRole::Assistant,
    }
}

/// Convert a ChatMessage to genai ChatMessage
pub fn to_genai_message(msg: ChatMessage) -> GenaiMessage {
    let content = GenaiContent::from(msg.content);
    match msg.role {
        MessageRole::System => GenaiMessage::system(content),
        MessageRole::User => GenaiMessage::user(content),
        MessageRole::Assistant => GenaiMessage::assistant(content),
    }
}

/// Convert a vector of messages to genai messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> Vec<GenaiMessage> {
    messages.into_iter().map(to_genai_message).collect()
}

// ============================================================================
// Tool Conversion: devduck -> genai
// ============================================================================

/// Convert a ToolSchema to genai Tool
pub fn to_genai_tool(tool: ToolSchema) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

/// Convert tool schemas to genai tools
pub fn to_genai_tools(tools: Vec<ToolSchema>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: devduck -> genai
// ============================================================================

/// Convert StreamChatOptions to genai ChatOptions
pub fn to_genai_options(options: &StreamChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // The classifier reads its answer from the captured tool calls at stream end
    genai_opts = genai_opts.with_capture_tool_calls(true);

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> devduck
// ============================================================================

/// Convert genai ToolCall to our ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Convert genai stream event to StreamChunk
pub fn from_genai_event(event: ChatStreamEvent) -> Option<Result<StreamChunk, ProviderError>> {
    match event {
        ChatStreamEvent::Chunk(chunk) => Some(Ok(StreamChunk::Text {
            text: chunk.content,
        })),
        ChatStreamEvent::ToolCallChunk(chunk) => Some(Ok(StreamChunk::ToolCallDelta {
            id: chunk.tool_call.call_id,
            name: Some(chunk.tool_call.fn_name),
            input_delta: Some(chunk.tool_call.fn_arguments.to_string()),
        })),
        ChatStreamEvent::End(end) => {
            // Only the first captured call matters: the router picks exactly one tool
            end.captured_tool_calls()
                .and_then(|calls| calls.first().map(|tc| from_genai_tool_call(tc)))
                .map(|tc| Ok(StreamChunk::ToolCall { tool_call: tc }))
        }
        ChatStreamEvent::Start => None,
        ChatStreamEvent::ReasoningChunk(_) => None,
        ChatStreamEvent::ThoughtSignatureChunk(_) => None,
    }
}

// ============================================================================
// Backend Resolution
// ============================================================================

/// Connection settings for one genai client
#[derive(Debug, Clone)]
pub struct GenaiTarget {
    /// Provider adapter id (e.g., "openai", "anthropic", "ollama")
    pub provider: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL; when set, requests go to this OpenAI-compatible endpoint
    pub api_base: Option<String>,
}

impl GenaiTarget {
    /// Build the target for a request against `provider`
    pub fn new(provider: impl Into<String>, model: &ProviderModelConfig) -> Self {
        Self {
            provider: provider.into(),
            api_key: model.api_key.clone(),
            api_base: model.api_base.clone(),
        }
    }
}

/// genai joins paths onto the endpoint, so it must end with a slash
pub fn normalize_api_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

/// Map a provider id to a genai adapter when the endpoint is overridden
fn adapter_for(provider: &str) -> AdapterKind {
    match provider.to_lowercase().as_str() {
        "anthropic" => AdapterKind::Anthropic,
        "gemini" | "google" => AdapterKind::Gemini,
        "ollama" => AdapterKind::Ollama,
        "groq" => AdapterKind::Groq,
        "cohere" => AdapterKind::Cohere,
        _ => AdapterKind::OpenAI,
    }
}

/// Create a genai Client with explicit auth and endpoint resolution
pub fn create_client(target: &GenaiTarget) -> Client {
    let auth_key = target.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = auth_key.clone();
            // `None` is fine for local servers that ignore auth
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let target_api_base = target.api_base.as_deref().map(normalize_api_base);
    let adapter_kind = adapter_for(&target.provider);

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let Some(base) = target_api_base.clone() else {
                // Native genai providers resolve normally
                return Ok(target);
            };
            let ServiceTarget { ref model, .. } = target;
            let resolved_model = ModelIden::new(adapter_kind, model.model_name.clone());

            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(base),
                auth: target.auth,
                model: resolved_model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}
