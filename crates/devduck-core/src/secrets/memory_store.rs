//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreResult};

/// Read-write secret store that lives only as long as the process
///
/// Used by tests and for keys supplied on the command line.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `(key, value)` pairs
    pub fn with_secrets<I, K, V>(initial: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: RwLock::new(
                initial
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.secrets.write().clear();
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        self.secrets.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_crud() {
        let store = MemorySecretStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("perplexity"), None);

        store.store("perplexity", "pplx-1").unwrap();
        assert_eq!(store.get("perplexity"), Some("pplx-1".to_string()));

        store.store("perplexity", "pplx-2").unwrap();
        assert_eq!(store.get("perplexity"), Some("pplx-2".to_string()));
        assert_eq!(store.len(), 1);

        store.delete("perplexity").unwrap();
        assert!(!store.has("perplexity"));
    }

    #[test]
    fn test_memory_store_with_secrets() {
        let store = MemorySecretStore::with_secrets([("local", "lm-studio"), ("perplexity", "pplx")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("local"), Some("lm-studio".to_string()));

        let info = store.get_info("perplexity");
        assert!(info.available);
        assert_eq!(info.source, "memory");

        store.clear();
        assert!(store.is_empty());
    }
}
