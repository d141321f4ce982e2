//! Handler strategies: how a selected tool turns text into fragments
//!
//! The built-in personas are a closed set matched in one place
//! (`StrategyKind::process`); anything registered at runtime goes through a
//! `CustomHandler` closure.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{Stream, StreamExt};

use crate::clients::ClientHandle;
use crate::providers::{ProviderResult, StreamResponse};
use crate::types::{CancellationToken, ChatMessage, StreamChunk, Tool};

use super::persona::PersonaStrategy;
use super::search::SearchStrategy;

/// Lazy, finite, one-shot sequence of text fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = ProviderResult<String>> + Send>>;

/// Everything a strategy needs for one exchange
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// The selected tool
    pub tool: Tool,
    /// Raw user text for this turn
    pub text: String,
    /// The bucket's turns so far, starting with the persona system prompt
    pub history: Vec<ChatMessage>,
    /// Backend the tool is bound to
    pub client: Arc<ClientHandle>,
    /// Cancelled when the consumer abandons the exchange
    pub cancel: CancellationToken,
}

impl ToolInvocation {
    /// History followed by `user_turn`
    pub fn messages_with(&self, user_turn: impl Into<String>) -> Vec<ChatMessage> {
        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(user_turn));
        messages
    }
}

type HandlerFn = dyn Fn(ToolInvocation) -> BoxFuture<'static, ProviderResult<FragmentStream>> + Send + Sync;

/// A runtime-registered handler
#[derive(Clone)]
pub struct CustomHandler {
    func: Arc<HandlerFn>,
}

impl CustomHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProviderResult<FragmentStream>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |invocation| Box::pin(f(invocation))),
        }
    }

    pub async fn call(&self, invocation: ToolInvocation) -> ProviderResult<FragmentStream> {
        (self.func)(invocation).await
    }
}

impl fmt::Debug for CustomHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomHandler")
    }
}

/// The handler a tool name dispatches to
#[derive(Debug, Clone)]
pub enum StrategyKind {
    /// Web-connected backend, token cap, citation markers stripped
    Search(SearchStrategy),
    /// Ideation coach persona
    Ideation(PersonaStrategy),
    /// Emotional support persona
    Therapist(PersonaStrategy),
    /// Runtime-registered extension
    Custom(CustomHandler),
}

impl StrategyKind {
    pub fn search(max_tokens: u32) -> Self {
        StrategyKind::Search(SearchStrategy::new(max_tokens))
    }

    pub fn ideation() -> Self {
        StrategyKind::Ideation(PersonaStrategy::ideation())
    }

    pub fn therapist() -> Self {
        StrategyKind::Therapist(PersonaStrategy::therapist())
    }

    pub fn custom<F, Fut>(f: F) -> Self
    where
        F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProviderResult<FragmentStream>> + Send + 'static,
    {
        StrategyKind::Custom(CustomHandler::new(f))
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Search(_) => "search",
            StrategyKind::Ideation(_) => "ideation",
            StrategyKind::Therapist(_) => "therapist",
            StrategyKind::Custom(_) => "custom",
        }
    }

    /// Start the exchange and return its fragments
    ///
    /// Resolves once the backend has accepted the request; the fragments
    /// themselves are produced lazily.
    pub async fn process(&self, invocation: ToolInvocation) -> ProviderResult<FragmentStream> {
        match self {
            StrategyKind::Search(search) => search.process(invocation).await,
            StrategyKind::Ideation(persona) | StrategyKind::Therapist(persona) => {
                persona.process(invocation).await
            }
            StrategyKind::Custom(handler) => handler.call(invocation).await,
        }
    }
}

/// Keep only the text of a provider stream; tool-call chunks are dropped
pub fn text_fragments(stream: StreamResponse) -> FragmentStream {
    Box::pin(stream.filter_map(|chunk| async move {
        match chunk {
            Ok(StreamChunk::Text { text }) if !text.is_empty() => Some(Ok(text)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        }
    }))
}
