//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::{SecretInfo, SecretStore, SecretStoreError, SecretStoreResult};

/// Tries each store in order for reads; writes go to the first store
///
/// Unavailable stores are skipped. An empty chain finds nothing and refuses
/// writes.
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }

    /// First available store that holds `key`
    pub fn find_store(&self, key: &str) -> Option<&Arc<dyn SecretStore>> {
        self.available().find(|s| s.has(key))
    }

    fn available(&self) -> impl Iterator<Item = &Arc<dyn SecretStore>> {
        self.stores.iter().filter(|s| s.is_available())
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.available().find_map(|s| s.get(key))
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        match self.stores.first() {
            Some(store) => store.store(key, value),
            None => Err(SecretStoreError::NotAvailable("empty chain".to_string())),
        }
    }

    /// Removes the key from every writable store holding it
    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        for store in self.available().filter(|s| s.has(key)) {
            match store.delete(key) {
                Ok(()) | Err(SecretStoreError::ReadOnly) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        self.find_store(key)
            .map(|s| SecretInfo::new(true, s.name()))
            .unwrap_or_else(SecretInfo::not_found)
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stores.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainSecretStore").field("stores", &names).finish()
    }
}
