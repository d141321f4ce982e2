//! Tool classification
//!
//! One non-streaming completion against the routing backend. The capability
//! list goes along both as function-calling tools and as plain text in the
//! system prompt, so backends without tool calling can still answer with a
//! bare name.

use crate::clients::ClientManager;
use crate::error::{RouterError, RouterResult};
use crate::providers::{Completion, StreamChatOptions};
use crate::types::{CancellationToken, ChatMessage, ToolChoice, ToolSchema};

/// Picks a tool name for an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    backend: String,
    model: Option<String>,
}

impl Classifier {
    /// Classify with `backend`'s default model
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The messages sent for one classification
    pub fn build_messages(
        &self,
        capabilities: &[ToolSchema],
        text: &str,
        routing_hint: Option<&str>,
    ) -> Vec<ChatMessage> {
        let mut prompt = String::from(
            "You route messages for a voice assistant. Choose exactly one tool for the \
             user's message by calling it. If you cannot call tools, reply with the tool \
             name only.\n\nAvailable tools:\n",
        );
        for capability in capabilities {
            prompt.push_str(&format!("- {}: {}\n", capability.name, capability.description));
        }
        if let Some(previous) = routing_hint {
            prompt.push_str(&format!(
                "\nThe previous message was handled by {}. If this message is a follow-up \
                 to that conversation, choose {} again.\n",
                previous, previous
            ));
        }

        vec![ChatMessage::system(prompt), ChatMessage::user(text)]
    }

    /// Ask the routing backend which tool should handle `text`
    ///
    /// Returns the name the backend chose, which may not be registered; the
    /// caller decides what to do about that.
    pub async fn classify(
        &self,
        clients: &ClientManager,
        capabilities: &[ToolSchema],
        text: &str,
        routing_hint: Option<&str>,
        cancel: CancellationToken,
    ) -> RouterResult<String> {
        let client = clients.resolve(&self.backend)?;
        let messages = self.build_messages(capabilities, text, routing_hint);
        let options = StreamChatOptions::new()
            .with_temperature(0.0)
            .with_tools(capabilities.to_vec())
            .with_tool_choice(ToolChoice::Required);

        let completion = client
            .complete(messages, self.model.as_deref(), options, cancel)
            .await?;
        parse_selection(&completion, capabilities)
    }
}

/// Pull one tool name out of a classification response
///
/// A tool call wins. Otherwise the trimmed text must be a registered name
/// (case-insensitive) or at least a single identifier-like word.
pub fn parse_selection(completion: &Completion, capabilities: &[ToolSchema]) -> RouterResult<String> {
    if let Some(call) = completion.tool_calls.first() {
        return Ok(call.name.clone());
    }

    let answer = completion
        .text
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.' || c == '*')
        .trim();

    if let Some(capability) = capabilities
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(answer))
    {
        return Ok(capability.name.clone());
    }

    let is_identifier = !answer.is_empty()
        && answer
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if is_identifier {
        Ok(answer.to_string())
    } else {
        Err(RouterError::ClassificationAmbiguous(format!(
            "no tool call and unusable text {:?}",
            completion.text
        )))
    }
}
