//! Logging utilities for structured tracing

use std::time::Instant;

/// Track operation timing and log on drop
pub struct Timer {
    start: Instant,
    operation: String,
}

impl Timer {
    /// Create a new timer for an operation
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.into(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        tracing::debug!(
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}

/// Log an error with structured context
pub fn log_error(operation: &str, error: &(dyn std::error::Error + 'static)) {
    tracing::error!(
        operation = %operation,
        error = %error,
        "Operation failed"
    );
}

/// Sink for failures that are recovered locally but still worth surfacing
pub trait ErrorReporter: Send + Sync {
    fn report(&self, operation: &str, error: &(dyn std::error::Error + 'static));
}

/// Default reporter: forwards to [`log_error`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, operation: &str, error: &(dyn std::error::Error + 'static)) {
        log_error(operation, error);
    }
}
