//! Logging abstractions for runtime-agnostic logging
//!
//! Library code logs through an `Arc<dyn Logger>` handed in by the embedder.
//! The CLI wires in `TracingLogger`; tests use `NoOpLogger` or
//! `RecordingLogger` when they need to assert on what was logged.

mod traits;
mod noop;
mod console;
mod recording;
mod tracing_logger;

pub use traits::Logger;
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use recording::{LogRecord, RecordingLogger};
pub use tracing_logger::TracingLogger;

pub use crate::types::LogLevel;
