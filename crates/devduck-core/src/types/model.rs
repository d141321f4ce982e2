//! Backend and model catalogue types

use serde::{Deserialize, Serialize};

/// Where a backend configuration came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// From user-level config (~/.config/devduck/config.yaml)
    NativeUser,
    /// From workspace-level config (.config/devduck/config.yaml)
    NativeWorkspace,
    /// Built-in defaults
    Builtin,
    /// Registered at runtime
    Runtime,
    /// Unknown source
    #[default]
    Unknown,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::NativeUser => write!(f, "~/.config/devduck/config.yaml"),
            ConfigSource::NativeWorkspace => write!(f, ".config/devduck/config.yaml"),
            ConfigSource::Builtin => write!(f, "Built-in defaults"),
            ConfigSource::Runtime => write!(f, "Runtime"),
            ConfigSource::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A named backend connection: endpoint, credentials and model catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Logical backend name tools refer to (e.g. "local", "perplexity")
    pub name: String,
    /// Provider adapter id (e.g. "openai", "anthropic", "ollama");
    /// OpenAI-compatible servers use "openai" together with `api_base`
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Whether this backend is enabled (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Key looked up in the secret store (defaults to the backend name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Inline API key; never written back to disk
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Models this backend serves
    #[serde(default)]
    pub models: Vec<String>,
    /// Model used when a caller does not name one (first catalogue entry otherwise)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Where this config came from (not serialized to file)
    #[serde(skip)]
    pub source: ConfigSource,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_enabled() -> bool {
    true
}

impl BackendConfig {
    /// Create a new backend configuration using the OpenAI protocol
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: default_provider(),
            enabled: true,
            api_base: None,
            secret_key: None,
            api_key: None,
            models: vec![],
            default_model: None,
            source: ConfigSource::Unknown,
        }
    }

    /// Set the provider adapter
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set an inline API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the secret store key
    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    /// Add models to the catalogue
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Set the default model
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Disable the backend
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the source of this configuration
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = source;
        self
    }

    /// The key used to look the credential up in a secret store
    pub fn credential_key(&self) -> &str {
        self.secret_key.as_deref().unwrap_or(&self.name)
    }

    /// The model used when none is requested explicitly
    pub fn resolved_default_model(&self) -> Option<&str> {
        self.default_model
            .as_deref()
            .or_else(|| self.models.first().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_builder() {
        let config = BackendConfig::new("perplexity")
            .with_api_base("https://api.perplexity.ai")
            .with_secret_key("PERPLEXITY_API_KEY")
            .with_models(vec!["sonar".to_string(), "sonar-pro".to_string()]);

        assert_eq!(config.provider, "openai");
        assert!(config.enabled);
        assert_eq!(config.credential_key(), "PERPLEXITY_API_KEY");
        assert_eq!(config.resolved_default_model(), Some("sonar"));

        let pinned = config.with_default_model("sonar-pro");
        assert_eq!(pinned.resolved_default_model(), Some("sonar-pro"));
    }

    #[test]
    fn test_credential_key_defaults_to_name() {
        let config = BackendConfig::new("local");
        assert_eq!(config.credential_key(), "local");
        assert_eq!(config.resolved_default_model(), None);
    }

    #[test]
    fn test_backend_config_never_serializes_api_key() {
        let config = BackendConfig::new("local")
            .with_api_key("lm-studio")
            .with_models(vec!["llama-3.2-3b-instruct".to_string()]);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"name\":\"local\""));
        assert!(json.contains("\"enabled\":true"));
        assert!(!json.contains("lm-studio"));
    }

    #[test]
    fn test_backend_config_yaml_defaults() {
        let config: BackendConfig = serde_yaml::from_str("name: local\n").unwrap();
        assert_eq!(config.provider, "openai");
        assert!(config.enabled);
        assert!(config.models.is_empty());
    }
}
