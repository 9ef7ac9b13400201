//! Observation of push stream failures.
//!
//! A [`RowStream`](crate::RowStream) yields plain rows, so a failure that ends
//! it early has nowhere to go. Register an [`ErrorObserver`] to see it;
//! without one the stream simply ends.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use libcursor::{Error, ErrorObserver};
//!
//! struct Alert;
//!
//! impl ErrorObserver for Alert {
//!     fn on_error(&self, error: &Error) {
//!         eprintln!("feed stopped: {error}");
//!     }
//! }
//!
//! let stream = cursor.stream_with_observer(Some(Arc::new(Alert)))?;
//! ```

use crate::Error;

/// Observer for errors that end a push stream.
///
/// End-of-data and cancellation are never reported; they end the stream
/// normally.
///
/// # Implementation Notes
///
/// - Called from the stream's background pump task.
/// - Called at most once per stream.
pub trait ErrorObserver: Send + Sync {
    /// Called with the error that ended the stream.
    fn on_error(&self, error: &Error);
}

impl<F> ErrorObserver for F
where
    F: Fn(&Error) + Send + Sync,
{
    fn on_error(&self, error: &Error) {
        self(error)
    }
}

/// Observer that logs stream errors using tracing.
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    level: LogLevel,
}

/// Log level for LoggingObserver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level.
    Debug,
    /// Log at info level.
    Info,
    /// Log at warn level (default).
    #[default]
    Warn,
}

impl LoggingObserver {
    /// Create a new logging observer with warn level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging observer with a specific level.
    pub fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    /// The level this observer logs at.
    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl ErrorObserver for LoggingObserver {
    fn on_error(&self, error: &Error) {
        match self.level {
            LogLevel::Debug => tracing::debug!(%error, "cursor stream ended with error"),
            LogLevel::Info => tracing::info!(%error, "cursor stream ended with error"),
            LogLevel::Warn => tracing::warn!(%error, "cursor stream ended with error"),
        }
    }
}
