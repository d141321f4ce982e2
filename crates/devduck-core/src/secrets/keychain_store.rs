//! System keychain secret store
//!
//! macOS Keychain, Windows Credential Manager, or the Secret Service API on
//! Linux, through the `keyring` crate.

use keyring::Entry;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Secret store backed by the OS keychain, namespaced by a service name
pub struct KeychainSecretStore {
    service_name: String,
}

impl KeychainSecretStore {
    /// Keychain store under the `devduck` service
    pub fn new() -> Self {
        Self::with_service("devduck")
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service_name: service.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> SecretStoreResult<Entry> {
        Entry::new(&self.service_name, key)
            .map_err(|e| SecretStoreError::Other(format!("keychain entry for {}: {}", key, e)))
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeychainSecretStore {
    fn name(&self) -> &str {
        "keychain"
    }

    /// Headless machines without a keychain daemon fail here
    fn is_available(&self) -> bool {
        Entry::new(&self.service_name, "__devduck_availability_check__").is_ok()
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key).ok()?.get_password() {
            Ok(password) => Some(password),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::debug!(target: "devduck", "keychain read for {} failed: {}", key, e);
                None
            }
        }
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SecretStoreError::Other(format!("keychain write for {}: {}", key, e)))
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretStoreError::Other(format!("keychain delete for {}: {}", key, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let store = KeychainSecretStore::new();
        assert_eq!(store.name(), "keychain");
        assert_eq!(store.service_name(), "devduck");
        assert_eq!(KeychainSecretStore::with_service("devduck-test").service_name(), "devduck-test");
    }

    #[test]
    #[ignore] // Requires system keychain
    fn test_store_and_get() {
        let store = KeychainSecretStore::with_service("devduck-test");
        let _ = store.delete("perplexity");

        store.store("perplexity", "pplx-test").unwrap();
        assert_eq!(store.get("perplexity"), Some("pplx-test".to_string()));

        store.delete("perplexity").unwrap();
        assert_eq!(store.get("perplexity"), None);
    }
}
