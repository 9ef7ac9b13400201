//! # libcursor
//!
//! Streaming result cursors for batch-oriented query protocol clients.
//!
//! A server answers a query with a sequence of batches. This library turns
//! them into one lazily produced sequence of rows and offers several ways to
//! consume it:
//! - Single-row pulls and bulk collection
//! - Callback loops, synchronous and asynchronous
//! - A pull-driven [`futures::Stream`]
//! - A push stream with pause, resume and backpressure
//!
//! The connection itself stays outside: a cursor only needs a [`Transport`]
//! that can read the next batch for a token and stop a query.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use libcursor::{Cursor, CursorOptions, Result, Token};
//!
//! async fn dump(connection: Arc<MyConnection>, token: Token, query: serde_json::Value) -> Result<()> {
//!     let cursor = Cursor::new(connection, token, query, CursorOptions::default());
//!     let rows = cursor.to_vec().await?;
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feeds
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut changes = cursor.stream_with_observer(Some(Arc::new(LoggingObserver::new())))?;
//! while let Some(change) = changes.next().await {
//!     println!("{change}");
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod decode;
mod error;
pub mod observer;
pub mod protocol;
pub mod transport;

pub use error::{Error, QueryErrorKind, Result, UsageError};

// Re-export the main cursor types at crate root
pub use cursor::{with_completion, Completed, Completion, Cursor, Mode, Phase, RowStream, Rows};

// Re-export commonly used config types at crate root
pub use config::{CursorOptions, CursorOptionsBuilder, Format};

// Re-export commonly used protocol types at crate root
pub use protocol::{CursorVariant, ErrorType, Note, Response, ResponseType, Token};

pub use decode::{PseudoTypeDecoder, RawDecoder, ValueDecoder};
pub use observer::{ErrorObserver, LogLevel, LoggingObserver};
pub use transport::Transport;
