//! ClientManager and ClientHandle

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{RouterError, RouterResult};
use crate::{log_debug, log_info};
use crate::logging::Logger;
use crate::providers::{
    create_provider, Completion, Provider, ProviderError, ProviderModelConfig, ProviderResult,
    StreamChatOptions, StreamResponse,
};
use crate::secrets::SecretStore;
use crate::types::{BackendConfig, CancellationToken, ChatMessage};

/// A configured backend: the provider that speaks its protocol plus the
/// endpoint, credential and model catalogue to use with it
pub struct ClientHandle {
    config: BackendConfig,
    provider: Arc<dyn Provider>,
    api_key: Option<String>,
}

impl ClientHandle {
    /// Bind a backend config to a provider; the inline `api_key` is used as-is
    pub fn new(config: BackendConfig, provider: Arc<dyn Provider>) -> Self {
        let api_key = config.api_key.clone();
        Self {
            config,
            provider,
            api_key,
        }
    }

    /// Override the credential
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Models this backend serves
    pub fn models(&self) -> &[String] {
        &self.config.models
    }

    pub fn default_model(&self) -> Option<&str> {
        self.config.resolved_default_model()
    }

    /// Request settings for `model`, or the default model when `None`
    pub fn model_config(&self, model: Option<&str>) -> ProviderResult<ProviderModelConfig> {
        let model = model.or_else(|| self.default_model()).ok_or_else(|| {
            ProviderError::Other(format!("backend {} has no model configured", self.name()))
        })?;

        let mut model_config = ProviderModelConfig::new(model);
        if let Some(key) = &self.api_key {
            model_config = model_config.with_api_key(key.clone());
        }
        if let Some(base) = &self.config.api_base {
            model_config = model_config.with_api_base(base.clone());
        }
        Ok(model_config)
    }

    /// Start a streaming completion against this backend
    pub async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<&str>,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let model_config = self.model_config(model)?;
        self.provider
            .stream_chat(messages, model_config, options, cancel_token)
            .await
    }

    /// Run a completion to the end
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<&str>,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        let model_config = self.model_config(model)?;
        self.provider
            .complete(messages, model_config, options, cancel_token)
            .await
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("name", &self.config.name)
            .field("provider", &self.provider.name())
            .field("api_base", &self.config.api_base)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Registry of named backends
///
/// Registration happens while the application is assembled; once the
/// manager is shared with the router it is only read.
pub struct ClientManager {
    clients: HashMap<String, Arc<ClientHandle>>,
    logger: Arc<dyn Logger>,
}

impl ClientManager {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            clients: HashMap::new(),
            logger,
        }
    }

    /// Build handles for every enabled backend
    ///
    /// The credential is the inline `api_key` if present, else whatever the
    /// secret store holds under `secret_key` (or the backend name). A missing
    /// credential is not an error; local servers need none.
    pub fn from_config(
        backends: &[BackendConfig],
        secrets: &dyn SecretStore,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let mut manager = Self::new(Arc::clone(&logger));

        for backend in backends {
            if !backend.enabled {
                log_debug!(logger, "[ClientManager] Skipping disabled backend {}", backend.name);
                continue;
            }

            let provider = create_provider(&backend.provider, Arc::clone(&logger));
            let mut handle = ClientHandle::new(backend.clone(), provider);
            if !handle.has_api_key() {
                if let Some(key) = secrets.get(backend.credential_key()) {
                    handle = handle.with_api_key(key);
                }
            }
            manager.register(backend.name.clone(), handle);
        }

        manager
    }

    /// Insert or overwrite the backend registered under `name`
    pub fn register(&mut self, name: impl Into<String>, handle: ClientHandle) {
        let name = name.into();
        log_info!(
            self.logger,
            "[ClientManager] Registered backend {} ({}, key: {})",
            name,
            handle.provider().name(),
            if handle.has_api_key() { "set" } else { "none" }
        );
        self.clients.insert(name, Arc::new(handle));
    }

    /// Look up a backend by name
    pub fn resolve(&self, name: &str) -> RouterResult<Arc<ClientHandle>> {
        self.clients
            .get(name)
            .cloned()
            .ok_or_else(|| RouterError::UnknownBackend(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Registered backend names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientManager")
            .field("clients", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::providers::MockProvider;
    use crate::secrets::MemorySecretStore;
    use crate::types::StreamChunk;
    use futures::StreamExt;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn local_backend() -> BackendConfig {
        BackendConfig::new("local")
            .with_api_base("http://localhost:1234/v1")
            .with_models(vec!["llama-3.2-3b-instruct".to_string()])
    }

    #[test]
    fn test_resolve_unknown_backend() {
        let manager = ClientManager::new(logger());
        let err = manager.resolve("perplexity").unwrap_err();
        assert!(matches!(err, RouterError::UnknownBackend(name) if name == "perplexity"));
    }

    #[test]
    fn test_register_overwrites() {
        let mut manager = ClientManager::new(logger());
        let mock = Arc::new(MockProvider::fixed("first", logger()));
        manager.register("local", ClientHandle::new(local_backend(), mock));
        let mock = Arc::new(MockProvider::fixed("second", logger()));
        manager.register(
            "local",
            ClientHandle::new(local_backend().with_default_model("other-model"), mock),
        );

        assert_eq!(manager.len(), 1);
        let handle = manager.resolve("local").unwrap();
        assert_eq!(handle.default_model(), Some("other-model"));
    }

    #[test]
    fn test_from_config_resolves_credentials() {
        let backends = vec![
            local_backend().with_api_key("lm-studio"),
            BackendConfig::new("perplexity")
                .with_api_base("https://api.perplexity.ai")
                .with_secret_key("PERPLEXITY_API_KEY")
                .with_models(vec!["llama-3.1-sonar-large-128k-online".to_string()]),
            BackendConfig::new("offline").disabled(),
            BackendConfig::new("keyless").with_provider("mock"),
        ];
        let secrets = MemorySecretStore::with_secrets([("PERPLEXITY_API_KEY", "pplx-123")]);

        let manager = ClientManager::from_config(&backends, &secrets, logger());
        assert_eq!(manager.names(), vec!["keyless", "local", "perplexity"]);
        assert!(!manager.contains("offline"));

        let local = manager.resolve("local").unwrap();
        assert_eq!(local.model_config(None).unwrap().api_key.as_deref(), Some("lm-studio"));

        let pplx = manager.resolve("perplexity").unwrap();
        let model = pplx.model_config(None).unwrap();
        assert_eq!(model.model, "llama-3.1-sonar-large-128k-online");
        assert_eq!(model.api_key.as_deref(), Some("pplx-123"));
        assert_eq!(model.api_base.as_deref(), Some("https://api.perplexity.ai"));

        let keyless = manager.resolve("keyless").unwrap();
        assert!(!keyless.has_api_key());
        assert_eq!(keyless.provider().name(), "mock");
    }

    #[test]
    fn test_model_config_requires_a_model() {
        let handle = ClientHandle::new(
            BackendConfig::new("empty"),
            Arc::new(MockProvider::echo(logger())),
        );
        assert!(handle.model_config(None).is_err());
        assert_eq!(handle.model_config(Some("explicit")).unwrap().model, "explicit");
    }

    #[tokio::test]
    async fn test_handle_streams_through_provider() {
        let mock = Arc::new(MockProvider::fixed("quack", logger()));
        let handle = ClientHandle::new(local_backend(), mock.clone());

        let mut stream = handle
            .stream_chat(
                vec![ChatMessage::user("hello")],
                None,
                StreamChatOptions::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            if let StreamChunk::Text { text: t } = chunk.unwrap() {
                text.push_str(&t);
            }
        }
        assert_eq!(text, "quack");
        assert_eq!(mock.last_request().unwrap().model, "llama-3.2-3b-instruct");

        let completion = handle
            .complete(
                vec![ChatMessage::user("hello")],
                Some("other"),
                StreamChatOptions::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(completion.text, "quack");
        assert_eq!(mock.last_request().unwrap().model, "other");
    }
}
