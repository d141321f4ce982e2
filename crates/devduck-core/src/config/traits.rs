//! Configuration provider trait

use async_trait::async_trait;

use super::app::AppConfig;
use crate::types::BackendConfig;

/// Source of the assistant's configuration
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory for testing
/// - `FileConfigProvider`: YAML file (~/.config/devduck/config.yaml)
///
/// Backend names are matched case-insensitively.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// The whole configuration
    async fn get_config(&self) -> ConfigResult<AppConfig>;

    /// Configured backends, including disabled ones
    async fn get_backends(&self) -> ConfigResult<Vec<BackendConfig>> {
        Ok(self.get_config().await?.backends)
    }

    async fn add_backend(&self, backend: BackendConfig) -> ConfigResult<()>;

    async fn update_backend(&self, name: &str, backend: BackendConfig) -> ConfigResult<()>;

    async fn remove_backend(&self, name: &str) -> ConfigResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    #[error("Backend already exists: {0}")]
    BackendExists(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Shared add/update/remove semantics over a backend list
pub(crate) fn add_backend_to(backends: &mut Vec<BackendConfig>, backend: BackendConfig) -> ConfigResult<()> {
    if backends.iter().any(|b| same_name(&b.name, &backend.name)) {
        return Err(ConfigError::BackendExists(backend.name));
    }
    backends.push(backend);
    Ok(())
}

pub(crate) fn update_backend_in(
    backends: &mut [BackendConfig],
    name: &str,
    backend: BackendConfig,
) -> ConfigResult<()> {
    match backends.iter_mut().find(|b| same_name(&b.name, name)) {
        Some(existing) => {
            *existing = backend;
            Ok(())
        }
        None => Err(ConfigError::BackendNotFound(name.to_string())),
    }
}

pub(crate) fn remove_backend_from(backends: &mut Vec<BackendConfig>, name: &str) -> ConfigResult<()> {
    let before = backends.len();
    backends.retain(|b| !same_name(&b.name, name));
    if backends.len() == before {
        Err(ConfigError::BackendNotFound(name.to_string()))
    } else {
        Ok(())
    }
}
