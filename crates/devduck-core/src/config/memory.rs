//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::BackendConfig;

use super::app::AppConfig;
use super::traits::{add_backend_to, remove_backend_from, update_backend_in, ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<AppConfig>,
}

impl MemoryConfigProvider {
    /// Start from the stock configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the whole configuration
    pub fn set_config(&self, config: AppConfig) {
        *self.config.write() = config;
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get_config(&self) -> ConfigResult<AppConfig> {
        Ok(self.config.read().clone())
    }

    async fn add_backend(&self, backend: BackendConfig) -> ConfigResult<()> {
        add_backend_to(&mut self.config.write().backends, backend)
    }

    async fn update_backend(&self, name: &str, backend: BackendConfig) -> ConfigResult<()> {
        update_backend_in(&mut self.config.write().backends, name, backend)
    }

    async fn remove_backend(&self, name: &str) -> ConfigResult<()> {
        remove_backend_from(&mut self.config.write().backends, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[tokio::test]
    async fn test_memory_config_provider() {
        let config = MemoryConfigProvider::with_config(AppConfig {
            backends: vec![],
            ..AppConfig::default()
        });
        assert!(config.get_backends().await.unwrap().is_empty());

        let gpu = BackendConfig::new("gpu").with_models(vec!["qwen2.5-7b".to_string()]);
        config.add_backend(gpu).await.unwrap();
        assert_eq!(config.get_backends().await.unwrap().len(), 1);

        // case insensitive
        assert!(matches!(
            config.add_backend(BackendConfig::new("GPU")).await,
            Err(ConfigError::BackendExists(_))
        ));

        let updated = BackendConfig::new("gpu")
            .with_models(vec!["qwen2.5-7b".to_string(), "llama-3.1-8b".to_string()]);
        config.update_backend("Gpu", updated).await.unwrap();
        assert_eq!(config.get_backends().await.unwrap()[0].models.len(), 2);

        config.remove_backend("gpu").await.unwrap();
        assert!(config.get_backends().await.unwrap().is_empty());
        assert!(matches!(
            config.remove_backend("gpu").await,
            Err(ConfigError::BackendNotFound(_))
        ));
        assert!(matches!(
            config.update_backend("gpu", BackendConfig::new("gpu")).await,
            Err(ConfigError::BackendNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_defaults_to_stock_config() {
        let config = MemoryConfigProvider::new();
        assert_eq!(config.get_config().await.unwrap(), AppConfig::default());
    }
}
