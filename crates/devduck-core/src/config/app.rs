//! The assistant's configuration model

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clients::ClientManager;
use crate::error::RouterResult;
use crate::logging::Logger;
use crate::router::{Classifier, Router};
use crate::secrets::SecretStore;
use crate::tools::{
    ideation_tool, internet_search_tool, therapist_tool, StrategyKind, ToolRegistry,
    DEFAULT_SEARCH_MAX_TOKENS, IDEATION,
};
use crate::types::{BackendConfig, ConfigSource, Tool};

use super::traits::{ConfigError, ConfigResult};

/// Built-in strategy a configured tool runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    Search,
    Ideation,
    Therapist,
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyName::Search => "search",
            StrategyName::Ideation => "ideation",
            StrategyName::Therapist => "therapist",
        };
        f.write_str(s)
    }
}

/// One routable tool as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    /// Backend name the tool runs on
    pub client_type: String,
    pub strategy: StrategyName,
}

impl ToolConfig {
    pub fn from_tool(tool: Tool, strategy: StrategyName) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            system_prompt: tool.system_prompt,
            client_type: tool.client_type,
            strategy,
        }
    }

    pub fn to_tool(&self) -> Tool {
        Tool::new(&self.name, &self.description, &self.system_prompt, &self.client_type)
    }
}

/// Classification and history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Backend that answers classification calls
    pub classifier_backend: String,
    /// Model for classification; the backend's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_model: Option<String>,
    /// Tool used when routing degrades
    pub default_tool: String,
    /// Token cap for search answers
    pub search_max_tokens: u32,
    /// Max user/assistant turns kept per bucket; unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            classifier_backend: "local".to_string(),
            classifier_model: None,
            default_tool: IDEATION.to_string(),
            search_max_tokens: DEFAULT_SEARCH_MAX_TOKENS,
            history_limit: None,
        }
    }
}

/// Top-level configuration
///
/// Sections missing from a file take their stock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backends: Vec<BackendConfig>,
    pub tools: Vec<ToolConfig>,
    pub router: RouterSettings,
}

impl Default for AppConfig {
    /// LM Studio for the personas and classification, Perplexity for search
    fn default() -> Self {
        Self {
            backends: vec![
                BackendConfig::new("local")
                    .with_api_base("http://localhost:1234/v1")
                    .with_api_key("lm-studio")
                    .with_models(vec!["llama-3.2-3b-instruct".to_string()])
                    .with_source(ConfigSource::Builtin),
                BackendConfig::new("perplexity")
                    .with_api_base("https://api.perplexity.ai")
                    .with_secret_key("PERPLEXITY_API_KEY")
                    .with_models(vec!["llama-3.1-sonar-large-128k-online".to_string()])
                    .with_source(ConfigSource::Builtin),
            ],
            tools: vec![
                ToolConfig::from_tool(internet_search_tool(), StrategyName::Search),
                ToolConfig::from_tool(ideation_tool(), StrategyName::Ideation),
                ToolConfig::from_tool(therapist_tool(), StrategyName::Therapist),
            ],
            router: RouterSettings::default(),
        }
    }
}

impl AppConfig {
    /// Parse YAML; missing sections fall back to the stock configuration
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Check that every name the router depends on resolves
    pub fn validate(&self) -> ConfigResult<()> {
        let enabled = |name: &str| self.backend(name).is_some_and(|b| b.enabled);

        if !self.tools.iter().any(|t| t.name == self.router.default_tool) {
            return Err(ConfigError::Invalid(format!(
                "default tool {} is not configured",
                self.router.default_tool
            )));
        }
        if !enabled(&self.router.classifier_backend) {
            return Err(ConfigError::Invalid(format!(
                "classifier backend {} is not an enabled backend",
                self.router.classifier_backend
            )));
        }
        if let Some(limit) = self.router.history_limit.filter(|limit| *limit < 2) {
            return Err(ConfigError::Invalid(format!(
                "history limit {} cannot hold a single exchange (minimum 2)",
                limit
            )));
        }
        if let Some(tool) = self.tools.iter().find(|t| !enabled(&t.client_type)) {
            return Err(ConfigError::Invalid(format!(
                "tool {} uses backend {} which is not an enabled backend",
                tool.name, tool.client_type
            )));
        }
        Ok(())
    }

    fn strategy_for(&self, name: StrategyName) -> StrategyKind {
        match name {
            StrategyName::Search => StrategyKind::search(self.router.search_max_tokens),
            StrategyName::Ideation => StrategyKind::ideation(),
            StrategyName::Therapist => StrategyKind::therapist(),
        }
    }

    /// Registry with the configured tools, in file order
    pub fn build_registry(&self, logger: Arc<dyn Logger>) -> ToolRegistry {
        let registry = ToolRegistry::new(logger);
        for tool in &self.tools {
            registry.register(tool.to_tool(), self.strategy_for(tool.strategy));
        }
        registry
    }

    /// Assemble the clients, registry and router described by this config
    pub fn build_router(&self, secrets: &dyn SecretStore, logger: Arc<dyn Logger>) -> RouterResult<Router> {
        let clients = ClientManager::from_config(&self.backends, secrets, Arc::clone(&logger));
        let registry = self.build_registry(Arc::clone(&logger));

        let mut classifier = Classifier::new(&self.router.classifier_backend);
        if let Some(model) = &self.router.classifier_model {
            classifier = classifier.with_model(model);
        }

        Router::builder(clients, registry)
            .classifier(classifier)
            .default_tool(&self.router.default_tool)
            .history_limit(self.router.history_limit)
            .logger(logger)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;
    use crate::tools::{INTERNET_SEARCH, THERAPIST};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let local = config.backend("local").unwrap();
        assert_eq!(local.api_base.as_deref(), Some("http://localhost:1234/v1"));
        assert_eq!(local.api_key.as_deref(), Some("lm-studio"));
        assert_eq!(local.resolved_default_model(), Some("llama-3.2-3b-instruct"));

        let pplx = config.backend("perplexity").unwrap();
        assert_eq!(pplx.credential_key(), "PERPLEXITY_API_KEY");

        let names: Vec<&str> = config.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![INTERNET_SEARCH, IDEATION, THERAPIST]);
        assert_eq!(config.router.default_tool, "ideation");
        assert_eq!(config.router.classifier_backend, "local");
        assert_eq!(config.router.search_max_tokens, 1024);
        assert_eq!(config.router.history_limit, None);
    }

    #[test]
    fn test_partial_yaml_keeps_stock_sections() {
        let yaml = r#"
router:
  classifier_model: qwen2.5-7b-instruct
  history_limit: 20
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.router.classifier_model.as_deref(), Some("qwen2.5-7b-instruct"));
        assert_eq!(config.router.history_limit, Some(20));
        assert_eq!(config.router.default_tool, "ideation");
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.tools.len(), 3);
    }

    #[test]
    fn test_yaml_tools_and_strategy_names() {
        let yaml = r#"
backends:
  - name: local
    api_base: http://localhost:1234/v1
    models: [llama-3.2-3b-instruct]
tools:
  - name: ideation
    description: Brainstorm
    system_prompt: You coach.
    client_type: local
    strategy: ideation
  - name: news
    description: Headlines
    system_prompt: You summarise news.
    client_type: local
    strategy: search
router:
  search_max_tokens: 300
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.tools[1].strategy, StrategyName::Search);

        let registry = config.build_registry(Arc::new(NoOpLogger));
        assert_eq!(registry.names(), vec!["ideation", "news"]);
        assert!(matches!(registry.lookup_handler("news").unwrap(), StrategyKind::Search(s) if s.max_tokens == 300));

        assert!(AppConfig::from_yaml("tools:\n  - name: x\n    strategy: poetry\n").is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let yaml = AppConfig::default().to_yaml().unwrap();
        assert!(!yaml.contains("lm-studio"));
        assert!(yaml.contains("PERPLEXITY_API_KEY"));
        assert!(yaml.contains("strategy: search"));
    }

    #[test]
    fn test_validate_reports_dangling_names() {
        let mut config = AppConfig::default();
        config.router.default_tool = "poet".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("poet")));

        let mut config = AppConfig::default();
        config.backends[1].enabled = false;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("internet_search")));

        let mut config = AppConfig::default();
        config.router.classifier_backend = "gpu".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.router.history_limit = Some(1);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("history limit 1")));
        config.router.history_limit = Some(2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_router_from_config() {
        let mut config = AppConfig::default();
        config.router.classifier_model = Some("router-model".to_string());
        config.router.history_limit = Some(10);
        let secrets = MemorySecretStore::with_secrets([("PERPLEXITY_API_KEY", "pplx-test")]);

        let router = config.build_router(&secrets, Arc::new(NoOpLogger)).unwrap();
        assert_eq!(router.default_tool(), "ideation");
        assert_eq!(router.classifier().backend(), "local");
        assert_eq!(router.classifier().model(), Some("router-model"));
        assert_eq!(router.store().history_limit(), Some(10));
        assert_eq!(router.clients().names(), vec!["local", "perplexity"]);
        assert!(router.clients().resolve("perplexity").unwrap().has_api_key());
        assert_eq!(router.registry().len(), 3);
    }
}
