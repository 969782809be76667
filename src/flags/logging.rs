//! Log sink handed to the flag client at construction.
//!
//! The client never calls a logging backend directly; it writes through a
//! [`LogSink`]. [`TracingLogSink`] is the adapter that forwards onto the
//! process-wide `tracing` subscriber.

use tracing::Level;

pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Forwards flag client messages to `tracing` under the `flag_client` target.
#[derive(Debug, Clone, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: Level, message: &str) {
        // tracing macros need a const level
        match level {
            Level::ERROR => tracing::error!(target: "flag_client", "{}", message),
            Level::WARN => tracing::warn!(target: "flag_client", "{}", message),
            Level::INFO => tracing::info!(target: "flag_client", "{}", message),
            Level::DEBUG => tracing::debug!(target: "flag_client", "{}", message),
            _ => tracing::trace!(target: "flag_client", "{}", message),
        }
    }
}
