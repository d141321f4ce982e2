//! Logger that forwards to `tracing`

use super::traits::Logger;

/// Forwards every message to the `tracing` macros under the `devduck` target
///
/// Filtering and formatting are left to whatever subscriber the binary
/// installs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "devduck", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "devduck", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "devduck", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "devduck", "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_usable_without_subscriber() {
        let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
        logger.debug("debug message");
        logger.info("info message");
        logger.warn("warn message");
        logger.error("error message");
    }
}
