//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Backend or provider name to the environment variables that may hold its key
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("perplexity", vec!["PERPLEXITY_API_KEY", "PPLX_API_KEY"]);
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("gemini", vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("groq", vec!["GROQ_API_KEY"]);
    m.insert("local", vec!["LOCAL_API_KEY", "LM_STUDIO_API_KEY"]);
    m.insert("lmstudio", vec!["LM_STUDIO_API_KEY"]);
    // Ollama serves without a key
    m.insert("ollama", vec![]);
    m
});

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Read-only secret store over the process environment
///
/// Lookup order for a key:
/// 1. the key itself as a variable name (`PERPLEXITY_API_KEY`)
/// 2. the variables mapped to it (`perplexity` → `PERPLEXITY_API_KEY`)
/// 3. `<KEY>_API_KEY`
#[derive(Debug, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    /// The environment variables consulted for a backend name
    pub fn env_vars_for(name: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(name.to_lowercase().as_str()).map(|v| v.as_slice())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = non_empty_var(key) {
            return Some(value);
        }

        if let Some(vars) = Self::env_vars_for(key) {
            if let Some(value) = vars.iter().find_map(|v| non_empty_var(v)) {
                return Some(value);
            }
        }

        non_empty_var(&format!("{}_API_KEY", key.to_uppercase()))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; the test harness runs in parallel.

    #[test]
    fn test_env_store_read_only() {
        let store = EnvSecretStore::new();
        assert_eq!(store.name(), "env");
        assert!(matches!(store.store("x", "y"), Err(SecretStoreError::ReadOnly)));
        assert!(matches!(store.delete("x"), Err(SecretStoreError::ReadOnly)));
    }

    #[test]
    fn test_env_store_direct_name() {
        env::set_var("DEVDUCK_TEST_DIRECT_SECRET", "direct");
        let store = EnvSecretStore::new();
        assert_eq!(store.get("DEVDUCK_TEST_DIRECT_SECRET"), Some("direct".to_string()));
        env::remove_var("DEVDUCK_TEST_DIRECT_SECRET");
    }

    #[test]
    fn test_env_store_suffix_lookup() {
        env::set_var("DUCKTESTBACKEND_API_KEY", "suffixed");
        let store = EnvSecretStore::new();
        assert_eq!(store.get("ducktestbackend"), Some("suffixed".to_string()));
        env::remove_var("DUCKTESTBACKEND_API_KEY");
    }

    #[test]
    fn test_env_store_empty_is_missing() {
        env::set_var("DEVDUCK_TEST_EMPTY_SECRET", "");
        let store = EnvSecretStore::new();
        assert_eq!(store.get("DEVDUCK_TEST_EMPTY_SECRET"), None);
        assert!(!store.get_info("DEVDUCK_TEST_EMPTY_SECRET").available);
        env::remove_var("DEVDUCK_TEST_EMPTY_SECRET");
    }

    #[test]
    fn test_env_var_mapping() {
        assert_eq!(
            EnvSecretStore::env_vars_for("Perplexity"),
            Some(&["PERPLEXITY_API_KEY", "PPLX_API_KEY"][..])
        );
        assert_eq!(EnvSecretStore::env_vars_for("ollama"), Some(&[][..]));
        assert_eq!(EnvSecretStore::env_vars_for("unknown_backend"), None);
    }
}
