//! Search strategy and citation stripping

use futures::{stream, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::providers::{ProviderResult, StreamChatOptions};

use super::strategy::{text_fragments, FragmentStream, ToolInvocation};

/// Token cap for search answers unless configured otherwise
pub const DEFAULT_SEARCH_MAX_TOKENS: u32 = 1024;

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").expect("valid citation regex"));
static PARTIAL_CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d*$").expect("valid partial regex"));

/// Remove every `[n]` citation marker from a complete text
pub fn strip_citations(text: &str) -> String {
    CITATION.replace_all(text, "").into_owned()
}

/// Incremental citation remover for streamed text
///
/// A marker may be split across fragments ("capital[" + "1]"), so a trailing
/// `[` or `[digits` is held back until the next fragment decides it. The
/// concatenated output always equals `strip_citations` over the concatenated
/// input.
#[derive(Debug, Default, Clone)]
pub struct CitationStripper {
    pending: String,
}

impl CitationStripper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment; returns the text that is safe to emit now
    ///
    /// `pending` keeps raw text, so stripping never runs twice over the
    /// same characters.
    pub fn push(&mut self, fragment: &str) -> String {
        self.pending.push_str(fragment);

        let split = PARTIAL_CITATION
            .find(&self.pending)
            .map_or(self.pending.len(), |tail| tail.start());
        let held = self.pending.split_off(split);
        let ready = std::mem::replace(&mut self.pending, held);
        strip_citations(&ready)
    }

    /// End of stream: whatever is held back was not a marker
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }

    /// Wrap a fragment stream so markers never reach the consumer
    pub fn wrap(inner: FragmentStream) -> FragmentStream {
        let state = (inner, CitationStripper::new(), false);
        Box::pin(stream::unfold(state, |(mut inner, mut stripper, done)| async move {
            if done {
                return None;
            }
            loop {
                match inner.next().await {
                    Some(Ok(fragment)) => {
                        let out = stripper.push(&fragment);
                        if !out.is_empty() {
                            return Some((Ok(out), (inner, stripper, false)));
                        }
                    }
                    Some(Err(e)) => return Some((Err(e), (inner, stripper, true))),
                    None => {
                        let rest = stripper.finish();
                        if rest.is_empty() {
                            return None;
                        }
                        return Some((Ok(rest), (inner, stripper, true)));
                    }
                }
            }
        }))
    }
}

/// One capped call to a web-connected backend, citations stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStrategy {
    pub max_tokens: u32,
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_MAX_TOKENS)
    }
}

impl SearchStrategy {
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    pub async fn process(&self, invocation: ToolInvocation) -> ProviderResult<FragmentStream> {
        let messages = invocation.messages_with(invocation.text.clone());
        let options = StreamChatOptions::new().with_max_tokens(self.max_tokens);
        let stream = invocation
            .client
            .stream_chat(messages, None, options, invocation.cancel.clone())
            .await?;
        Ok(CitationStripper::wrap(text_fragments(stream)))
    }
}
