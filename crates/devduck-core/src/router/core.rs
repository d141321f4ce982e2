//! Router: classify, seed, dispatch, fall back

use std::sync::Arc;

use futures::StreamExt;

use crate::clients::ClientManager;
use crate::error::{RouterError, RouterResult};
use crate::{log_debug, log_error, log_info, log_warn};
use crate::logging::{Logger, NoOpLogger};
use crate::tools::{FragmentStream, ToolInvocation, ToolRegistry, IDEATION};
use crate::types::CancellationToken;

use super::classifier::Classifier;
use super::exchange::{Exchange, ExchangeParts, FallbackReason};
use super::history::ConversationStore;
use super::session::SessionContext;

/// Picks a tool for each utterance and streams that tool's reply
pub struct Router {
    clients: Arc<ClientManager>,
    registry: Arc<ToolRegistry>,
    store: Arc<ConversationStore>,
    classifier: Classifier,
    default_tool: String,
    logger: Arc<dyn Logger>,
}

/// A dispatched strategy with its first fragment already received
struct Dispatched {
    fragments: FragmentStream,
    first: Option<String>,
}

impl Router {
    pub fn builder(clients: ClientManager, registry: ToolRegistry) -> RouterBuilder {
        RouterBuilder::new(clients, registry)
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn default_tool(&self) -> &str {
        &self.default_tool
    }

    /// Route one utterance
    ///
    /// Returns once the selected tool has produced its first fragment (or
    /// finished without any). Classification problems and a failed dispatch
    /// are absorbed by serving the turn with the default tool, retried once;
    /// `Exchange::fallback` says why. Only a failure of that retry, or a
    /// busy session, is returned as an error.
    pub async fn route(&self, ctx: &mut SessionContext, text: &str) -> RouterResult<Exchange> {
        let session_guard = self.store.try_lock_session(ctx.session_id())?;
        let cancel = CancellationToken::new();

        let (selected, mut fallback) = self.select_tool(ctx, text, cancel.clone()).await;

        match ctx.routing_hint() {
            Some(previous) if previous != selected => {
                log_info!(self.logger, "[Router] Switching from {} to {}", previous, selected);
            }
            Some(_) => {}
            None => log_info!(self.logger, "[Router] Selected tool {}", selected),
        }
        ctx.set_routing_hint(selected.clone());

        let mut tool = selected;
        let dispatched = match self.dispatch(ctx.session_id(), &tool, text, cancel.clone()).await {
            Ok(dispatched) => dispatched,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                log_warn!(
                    self.logger,
                    "[Router] Dispatch to {} failed ({}), retrying with {}",
                    tool, e, self.default_tool
                );
                fallback = Some(FallbackReason::DispatchFailed {
                    tool: tool.clone(),
                    error: e.to_string(),
                });
                tool = self.default_tool.clone();
                self.dispatch(ctx.session_id(), &tool, text, cancel.clone())
                    .await
                    .map_err(|retry| {
                        log_error!(self.logger, "[Router] Fallback to {} failed: {}", tool, retry);
                        RouterError::fallback_failed(tool.clone(), retry)
                    })?
            }
        };

        Ok(Exchange::new(ExchangeParts {
            session_id: ctx.session_id().to_string(),
            tool,
            user_text: text.to_string(),
            fallback,
            fragments: dispatched.fragments,
            first: dispatched.first,
            cancel,
            session_guard,
            store: Arc::clone(&self.store),
            logger: Arc::clone(&self.logger),
        }))
    }

    /// Classify and validate; never fails, degrading to the default tool
    async fn select_tool(
        &self,
        ctx: &SessionContext,
        text: &str,
        cancel: CancellationToken,
    ) -> (String, Option<FallbackReason>) {
        let capabilities = self.registry.capability_list();
        let result = self
            .classifier
            .classify(&self.clients, &capabilities, text, ctx.routing_hint(), cancel)
            .await;

        match result {
            Ok(name) if self.registry.contains(&name) => {
                log_debug!(self.logger, "[Router] Classifier chose {}", name);
                (name, None)
            }
            Ok(name) => {
                log_warn!(
                    self.logger,
                    "[Router] Classifier chose unknown tool {}, using {}",
                    name, self.default_tool
                );
                (self.default_tool.clone(), Some(FallbackReason::UnknownTool(name)))
            }
            Err(e) => {
                log_warn!(
                    self.logger,
                    "[Router] Classification failed ({}), using {}",
                    e, self.default_tool
                );
                (
                    self.default_tool.clone(),
                    Some(FallbackReason::ClassificationFailed(e.to_string())),
                )
            }
        }
    }

    /// Seed the bucket, start the strategy and wait for its first fragment
    async fn dispatch(
        &self,
        session_id: &str,
        tool_name: &str,
        text: &str,
        cancel: CancellationToken,
    ) -> RouterResult<Dispatched> {
        let tool = self.registry.lookup_tool(tool_name)?;
        let strategy = self.registry.lookup_handler(tool_name)?;
        let client = self.clients.resolve(&tool.client_type)?;

        if self.store.seed(session_id, tool_name, &tool.system_prompt) {
            log_debug!(self.logger, "[Router] Seeded ({}, {})", session_id, tool_name);
        }

        let invocation = ToolInvocation {
            history: self.store.turns(session_id, tool_name),
            text: text.to_string(),
            client,
            cancel,
            tool,
        };

        log_info!(
            self.logger,
            "[Router] Dispatching to {} ({})",
            tool_name,
            strategy.label()
        );
        let mut fragments = strategy.process(invocation).await?;
        let first = match fragments.next().await {
            Some(Ok(fragment)) => Some(fragment),
            Some(Err(e)) => return Err(e.into()),
            None => None,
        };

        Ok(Dispatched { fragments, first })
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("clients", &self.clients)
            .field("registry", &self.registry)
            .field("classifier", &self.classifier)
            .field("default_tool", &self.default_tool)
            .finish()
    }
}

/// Assembles a `Router`
pub struct RouterBuilder {
    clients: ClientManager,
    registry: ToolRegistry,
    classifier: Classifier,
    default_tool: String,
    history_limit: Option<usize>,
    logger: Arc<dyn Logger>,
}

impl RouterBuilder {
    /// Defaults: classify on the `local` backend, fall back to `ideation`
    pub fn new(clients: ClientManager, registry: ToolRegistry) -> Self {
        Self {
            clients,
            registry,
            classifier: Classifier::new("local"),
            default_tool: IDEATION.to_string(),
            history_limit: None,
            logger: Arc::new(NoOpLogger),
        }
    }

    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn default_tool(mut self, tool: impl Into<String>) -> Self {
        self.default_tool = tool.into();
        self
    }

    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Fails with `UnknownTool` if the default tool is not registered
    pub fn build(self) -> RouterResult<Router> {
        if !self.registry.contains(&self.default_tool) {
            return Err(RouterError::UnknownTool(self.default_tool));
        }

        let store = match self.history_limit {
            Some(limit) => ConversationStore::with_history_limit(limit),
            None => ConversationStore::new(),
        };

        Ok(Router {
            clients: Arc::new(self.clients),
            registry: Arc::new(self.registry),
            store: Arc::new(store),
            classifier: self.classifier,
            default_tool: self.default_tool,
            logger: self.logger,
        })
    }
}
