//! DevDuck Core
//!
//! Tool-selection router for a developer assistant. Each user message is
//! classified onto one registered tool, dispatched to the backend that tool
//! runs on, and streamed back while the conversation is kept per
//! (session, tool) pair.
//!
//! ## Routing a message
//!
//! ```rust,ignore
//! use devduck_core::{config::AppConfig, secrets, SessionContext, TracingLogger};
//!
//! let config = AppConfig::default();
//! let router = config.build_router(&secrets::default_store(), Arc::new(TracingLogger))?;
//!
//! let mut session = SessionContext::new("terminal");
//! let mut exchange = router.route(&mut session, "What is new in Rust 1.80?").await?;
//! while let Some(fragment) = exchange.next().await {
//!     print!("{}", fragment?);
//! }
//! exchange.commit()?;
//! ```

pub mod types;
pub mod error;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod clients;
pub mod tools;
pub mod router;

// Re-export commonly used types
pub use types::{
    BackendConfig, CancellationToken, ChatMessage, ConfigSource, LogLevel, MessageRole,
    StreamChunk, Tool, ToolCall, ToolChoice, ToolSchema,
};

pub use error::{RouterError, RouterResult};

pub use secrets::{
    SecretStore, SecretInfo, SecretStoreError, SecretStoreResult,
    EnvSecretStore, MemorySecretStore, ChainSecretStore, KeychainSecretStore,
};

pub use logging::{Logger, NoOpLogger, ConsoleLogger, TracingLogger};

pub use config::{AppConfig, ConfigProvider, FileConfigProvider, MemoryConfigProvider};

pub use providers::{Provider, ProviderError, ProviderResult, MockProvider};

pub use clients::{ClientHandle, ClientManager};

pub use tools::{StrategyKind, ToolInvocation, ToolRegistry};

pub use router::{Exchange, FallbackReason, Router, RouterBuilder, SessionContext};
