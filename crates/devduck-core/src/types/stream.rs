//! Items of a backend's response stream

use super::tool::ToolCall;

/// One item of a streamed backend response
///
/// Strategies only forward `Text`; the classifier reads `ToolCall`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Text { text: String },
    /// A finished tool call, reported once the backend has all arguments
    ToolCall { tool_call: ToolCall },
    /// Argument fragment of a tool call still being generated
    ToolCallDelta {
        id: String,
        name: Option<String>,
        input_delta: Option<String>,
    },
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        StreamChunk::Text { text: text.into() }
    }

    pub fn tool_call(tool_call: ToolCall) -> Self {
        StreamChunk::ToolCall { tool_call }
    }

    /// The chunk's text, or `None` for tool-call chunks
    pub fn into_text(self) -> Option<String> {
        match self {
            StreamChunk::Text { text } => Some(text),
            StreamChunk::ToolCall { .. } | StreamChunk::ToolCallDelta { .. } => None,
        }
    }
}
