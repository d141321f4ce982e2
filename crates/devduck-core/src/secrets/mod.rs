//! Credential lookup for backends
//!
//! `ClientManager::from_config` asks a `SecretStore` for each backend's key.
//! Stores can be chained so that, for example, an explicit in-memory key wins
//! over the OS keychain, which wins over the environment.

mod traits;
mod env_store;
mod memory_store;
mod chain_store;
mod keychain_store;

pub use traits::{SecretInfo, SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;
pub use keychain_store::KeychainSecretStore;

use std::sync::Arc;

/// The store the CLI uses: keychain first when one is reachable, then the
/// environment
pub fn default_store() -> ChainSecretStore {
    let keychain = KeychainSecretStore::new();
    let mut stores: Vec<Arc<dyn SecretStore>> = Vec::new();
    if keychain.is_available() {
        stores.push(Arc::new(keychain));
    }
    stores.push(Arc::new(EnvSecretStore::new()));
    ChainSecretStore::new(stores)
}
