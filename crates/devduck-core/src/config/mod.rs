//! Configuration: backends, tools and router settings
//!
//! Supports multiple configuration sources:
//! - `MemoryConfigProvider`: In-memory for testing
//! - `FileConfigProvider`: YAML file-based (user/workspace level)
//!
//! A missing file means the stock setup: LM Studio on localhost for
//! classification and the personas, Perplexity for internet search.

mod app;
mod traits;
mod memory;
mod file;

pub use app::{AppConfig, RouterSettings, StrategyName, ToolConfig};
pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::{FileConfigProvider, ConfigLevel};
