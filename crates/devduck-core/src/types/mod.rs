//! Core types shared by the router, registries and providers

mod message;
mod model;
mod tool;
mod stream;
mod cancellation;
mod log_level;

pub use message::{ChatMessage, ConversationTurn, MessageRole};
pub use model::{BackendConfig, ConfigSource};
pub use tool::{Tool, ToolCall, ToolChoice, ToolSchema};
pub use stream::StreamChunk;
pub use cancellation::{CancellationToken, DropGuard};
pub use log_level::LogLevel;
