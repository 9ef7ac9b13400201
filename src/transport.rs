//! The connection contract a cursor consumes.
//!
//! A cursor never owns the connection. Many cursors share one transport and
//! address every request by their own [`Token`].
//!
//! # Architecture
//!
//! ```text
//! Cursor                              Transport
//! ┌─────────────┐                    ┌─────────────┐
//! │ token 7     │──send_continue(7)─▶│             │
//! │             │◀─read_next_batch(7)│  shared     │◀──▶ server
//! │             │──send_stop(7)─────▶│  connection │
//! └─────────────┘                    └─────────────┘
//! ```
//!
//! The initial batch is answered for the query itself, so the cursor only
//! sends a continuation request before the second and later reads.

use std::future::Future;

use crate::protocol::{Response, Token};
use crate::Result;

/// A connection that can answer batch requests for a token.
///
/// # Implementation Notes
///
/// - `read_next_batch` is never called again for a token until the previous
///   call for that token has resolved.
/// - `send_stop` is best-effort; the cursor only logs a failure.
/// - A connection closed by another party should surface as
///   [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) from
///   `read_next_batch`, which closes the cursor.
pub trait Transport: Send + Sync + 'static {
    /// Wait for the next response addressed to `token`.
    fn read_next_batch(&self, token: Token) -> impl Future<Output = Result<Response>> + Send;

    /// Ask the server for the next batch of an already running query.
    fn send_continue(&self, token: Token) -> Result<()>;

    /// Ask the server to stop an already running query.
    fn send_stop(&self, token: Token) -> Result<()>;

    /// Whether the connection is currently open.
    fn is_open(&self) -> bool;
}
