//! The handle a caller drains for one routed turn

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::{stream, FutureExt, Stream, StreamExt};
use tokio::sync::OwnedMutexGuard;

use crate::error::{RouterError, RouterResult};
use crate::{log_debug, log_info, log_warn};
use crate::logging::Logger;
use crate::providers::ProviderError;
use crate::tools::FragmentStream;
use crate::types::{CancellationToken, DropGuard};

use super::history::ConversationStore;

/// Why the router served a turn with the default tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The classifier named a tool that is not registered
    UnknownTool(String),
    /// The classification call failed or gave no usable answer
    ClassificationFailed(String),
    /// The selected tool's backend failed before producing a fragment
    DispatchFailed { tool: String, error: String },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::UnknownTool(name) => write!(f, "unknown tool {}", name),
            FallbackReason::ClassificationFailed(err) => write!(f, "classification failed: {}", err),
            FallbackReason::DispatchFailed { tool, error } => {
                write!(f, "dispatch to {} failed: {}", tool, error)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeState {
    Streaming,
    Completed,
    Failed,
}

/// Everything the router hands over once a strategy is streaming
pub(crate) struct ExchangeParts {
    pub session_id: String,
    pub tool: String,
    pub user_text: String,
    pub fallback: Option<FallbackReason>,
    pub fragments: FragmentStream,
    /// First fragment, already pulled by the router; `None` if the stream was empty
    pub first: Option<String>,
    pub cancel: CancellationToken,
    pub session_guard: OwnedMutexGuard<()>,
    pub store: Arc<ConversationStore>,
    pub logger: Arc<dyn Logger>,
}

/// One in-flight turn: a lazy, one-shot stream of reply fragments
///
/// The session stays claimed until the exchange is committed or dropped.
/// Dropping it before the end cancels the backend request and persists
/// nothing. History only changes through `commit`, which requires the
/// stream to have been drained without error.
pub struct Exchange {
    session_id: String,
    tool: String,
    user_text: String,
    fallback: Option<FallbackReason>,
    fragments: FragmentStream,
    first: Option<String>,
    reply: String,
    state: ExchangeState,
    cancel: CancellationToken,
    /// Resolves on `cancel`, even while the backend is silent
    cancelled: BoxFuture<'static, ()>,
    _cancel_on_drop: DropGuard,
    _session_guard: OwnedMutexGuard<()>,
    store: Arc<ConversationStore>,
    logger: Arc<dyn Logger>,
}

impl Exchange {
    pub(crate) fn new(parts: ExchangeParts) -> Self {
        let state = if parts.first.is_some() {
            ExchangeState::Streaming
        } else {
            ExchangeState::Completed
        };
        Self {
            session_id: parts.session_id,
            tool: parts.tool,
            user_text: parts.user_text,
            fallback: parts.fallback,
            fragments: parts.fragments,
            first: parts.first,
            reply: String::new(),
            state,
            cancelled: {
                let token = parts.cancel.clone();
                async move { token.cancelled().await }.boxed()
            },
            _cancel_on_drop: parts.cancel.clone().drop_guard(),
            cancel: parts.cancel,
            _session_guard: parts.session_guard,
            store: parts.store,
            logger: parts.logger,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The tool serving this turn (the default tool after a fallback)
    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    /// Set when routing degraded to the default tool
    pub fn fallback(&self) -> Option<&FallbackReason> {
        self.fallback.as_ref()
    }

    /// Text received so far
    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Whether the stream ended cleanly
    pub fn is_complete(&self) -> bool {
        self.state == ExchangeState::Completed
    }

    /// Stop the backend request
    ///
    /// The next poll yields a cancellation error without waiting for the
    /// backend, and the upstream stream is dropped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain the remaining fragments and return the whole reply
    pub async fn drain(&mut self) -> RouterResult<String> {
        while let Some(fragment) = self.next().await {
            fragment?;
        }
        Ok(self.reply.clone())
    }

    /// Persist the exchange into its bucket and release the session
    ///
    /// The raw user text and the full reply are appended. Returns the
    /// bucket's new turn count.
    pub fn commit(self) -> RouterResult<usize> {
        if self.state != ExchangeState::Completed {
            return Err(RouterError::IncompleteExchange);
        }
        let count = self
            .store
            .append_exchange(&self.session_id, &self.tool, &self.user_text, &self.reply);
        log_debug!(
            self.logger,
            "[Router] Committed exchange to ({}, {}), {} turns",
            self.session_id, self.tool, count
        );
        Ok(count)
    }
}

impl Stream for Exchange {
    type Item = RouterResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.state == ExchangeState::Streaming && this.cancelled.as_mut().poll(cx).is_ready() {
            this.state = ExchangeState::Failed;
            this.first = None;
            this.fragments = Box::pin(stream::empty());
            log_info!(
                this.logger,
                "[Router] Stream for ({}, {}) cancelled",
                this.session_id, this.tool
            );
            return Poll::Ready(Some(Err(ProviderError::Cancelled.into())));
        }
        if let Some(first) = this.first.take() {
            this.reply.push_str(&first);
            return Poll::Ready(Some(Ok(first)));
        }
        if this.state != ExchangeState::Streaming {
            return Poll::Ready(None);
        }

        match this.fragments.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(fragment))) => {
                this.reply.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.state = ExchangeState::Failed;
                log_warn!(
                    this.logger,
                    "[Router] Stream for ({}, {}) failed: {}",
                    this.session_id, this.tool, e
                );
                Poll::Ready(Some(Err(e.into())))
            }
            Poll::Ready(None) => {
                this.state = ExchangeState::Completed;
                log_debug!(
                    this.logger,
                    "[Router] Stream for ({}, {}) ended, {} chars",
                    this.session_id,
                    this.tool,
                    this.reply.len()
                );
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        if self.state == ExchangeState::Streaming {
            log_debug!(
                self.logger,
                "[Router] Exchange on ({}, {}) abandoned, cancelling backend request",
                self.session_id, self.tool
            );
        }
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("session_id", &self.session_id)
            .field("tool", &self.tool)
            .field("fallback", &self.fallback)
            .field("state", &self.state)
            .field("reply_len", &self.reply.len())
            .finish()
    }
}
