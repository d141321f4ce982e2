//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/devduck/config.yaml) and workspace-level (.config/devduck/config.yaml) config.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{BackendConfig, ConfigSource};

use super::app::AppConfig;
use super::traits::{add_backend_to, remove_backend_from, update_backend_in, ConfigProvider, ConfigResult};

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/devduck/config.yaml)
    User,
    /// Workspace-level config (.config/devduck/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }

    fn source(&self) -> ConfigSource {
        match self {
            ConfigLevel::User => ConfigSource::NativeUser,
            ConfigLevel::Workspace => ConfigSource::NativeWorkspace,
        }
    }
}

/// File-based configuration provider
///
/// # Example
///
/// ```no_run
/// use devduck_core::config::FileConfigProvider;
///
/// // Workspace config when present, user config otherwise
/// let config = FileConfigProvider::discover(".");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<AppConfig>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// User-level config provider (~/.config/devduck/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("devduck").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level config provider (.config/devduck/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("devduck").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// The workspace file if it exists, else the user file
    pub fn discover(workspace_root: impl AsRef<Path>) -> Self {
        let workspace = Self::workspace(workspace_root);
        if workspace.exists() {
            workspace
        } else {
            Self::user()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<AppConfig> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut config = AppConfig::from_yaml(&content)?;
        let source = self.level.source();
        for backend in &mut config.backends {
            if backend.source == ConfigSource::Unknown {
                backend.source = source.clone();
            }
        }
        Ok(config)
    }

    fn save(&self, config: &AppConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, config.to_yaml()?)?;
        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    fn cached(&self) -> ConfigResult<AppConfig> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<AppConfig> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Write the stock configuration if no file exists yet
    pub fn init(&self) -> ConfigResult<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&AppConfig::default())?;
        Ok(true)
    }

    /// Copy the current file next to itself with a `.yaml.backup` extension
    pub fn backup(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }
        let backup_path = self.path.with_extension("yaml.backup");
        fs::copy(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }

    fn modify_backends<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Vec<BackendConfig>) -> ConfigResult<()>,
    {
        let mut config = self.cached()?;
        f(&mut config.backends)?;
        self.save(&config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn get_config(&self) -> ConfigResult<AppConfig> {
        self.cached()
    }

    async fn add_backend(&self, backend: BackendConfig) -> ConfigResult<()> {
        self.modify_backends(|backends| add_backend_to(backends, backend))
    }

    async fn update_backend(&self, name: &str, backend: BackendConfig) -> ConfigResult<()> {
        self.modify_backends(|backends| update_backend_in(backends, name, backend))
    }

    async fn remove_backend(&self, name: &str) -> ConfigResult<()> {
        self.modify_backends(|backends| remove_backend_from(backends, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_stock_config() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);

        assert!(!provider.exists());
        let config = provider.get_config().await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backends[0].source, ConfigSource::Builtin);
    }

    #[tokio::test]
    async fn test_add_backend_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        provider
            .add_backend(
                BackendConfig::new("groq")
                    .with_provider("groq")
                    .with_models(vec!["llama-3.1-70b-versatile".to_string()]),
            )
            .await
            .unwrap();
        assert!(provider.exists());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("llama-3.1-70b-versatile"));
        assert!(content.contains("internet_search"));

        let reread = FileConfigProvider::new(&path, ConfigLevel::User);
        let backends = reread.get_backends().await.unwrap();
        assert_eq!(backends.len(), 3);
        let groq = backends.iter().find(|b| b.name == "groq").unwrap();
        assert_eq!(groq.source, ConfigSource::NativeUser);

        assert!(matches!(
            reread.add_backend(BackendConfig::new("Groq")).await,
            Err(ConfigError::BackendExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::workspace(dir.path());
        assert!(provider.init().unwrap());
        assert!(!provider.init().unwrap());

        provider
            .update_backend("LOCAL", BackendConfig::new("local").with_api_base("http://10.0.0.5:1234/v1"))
            .await
            .unwrap();
        provider.remove_backend("perplexity").await.unwrap();

        let config = provider.reload().unwrap();
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].api_base.as_deref(), Some("http://10.0.0.5:1234/v1"));
        assert_eq!(config.backends[0].source, ConfigSource::NativeWorkspace);
        assert!(matches!(
            provider.remove_backend("perplexity").await,
            Err(ConfigError::BackendNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "backends: {not: [a list").unwrap();
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);
        assert!(matches!(provider.reload(), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_discover_prefers_workspace() {
        let dir = tempdir().unwrap();
        let workspace = FileConfigProvider::workspace(dir.path());
        workspace.init().unwrap();

        let found = FileConfigProvider::discover(dir.path());
        assert_eq!(found.level(), ConfigLevel::Workspace);
        assert_eq!(found.path(), workspace.path());
    }

    #[test]
    fn test_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        assert!(provider.backup().unwrap().is_none());
        fs::write(&path, "backends: []").unwrap();

        let backup_path = provider.backup().unwrap().unwrap();
        assert!(backup_path.exists());
        assert!(backup_path.to_string_lossy().ends_with("config.yaml.backup"));
    }
}
