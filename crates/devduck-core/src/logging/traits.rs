//! Logger trait and formatting macros

/// Sink for the router's diagnostic messages
///
/// Components take an `Arc<dyn Logger>` at construction so the host decides
/// where messages go:
/// - `NoOpLogger`: Silent logger for testing
/// - `ConsoleLogger`: Prefixed lines on stderr
/// - `TracingLogger`: Forwards to the `tracing` ecosystem
/// - `RecordingLogger`: Keeps messages in memory for assertions
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);
}

/// `log_debug!(logger, "fmt", args..)` formats and sends at debug level
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        {
            use $crate::logging::Logger as _;
            $logger.debug(&format!($($arg)+))
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        {
            use $crate::logging::Logger as _;
            $logger.info(&format!($($arg)+))
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        {
            use $crate::logging::Logger as _;
            $logger.warn(&format!($($arg)+))
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        {
            use $crate::logging::Logger as _;
            $logger.error(&format!($($arg)+))
        }
    };
}
