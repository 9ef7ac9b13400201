//! Iterator-style consumption as a [`futures::Stream`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use serde_json::Value;

use super::machine::Cursor;
use crate::transport::Transport;
use crate::Result;

/// Rows of a cursor as an async stream.
///
/// Created by [`Cursor::rows`]. The end of the cursor and cancellation end
/// the stream; any other error is yielded once and then the stream ends.
///
/// # Example
///
/// ```ignore
/// use futures::StreamExt;
///
/// let mut rows = cursor.rows();
/// while let Some(row) = rows.next().await {
///     println!("{}", row?);
/// }
/// ```
pub struct Rows<T: Transport> {
    cursor: Cursor<T>,
    pending: Option<BoxFuture<'static, Result<Value>>>,
    done: bool,
}

impl<T: Transport> Cursor<T> {
    /// Iterate the rows as a [`futures::Stream`].
    pub fn rows(&self) -> Rows<T> {
        Rows {
            cursor: self.clone(),
            pending: None,
            done: false,
        }
    }
}

impl<T: Transport> Stream for Rows<T> {
    type Item = Result<Value>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let pending = this.pending.get_or_insert_with(|| {
            let cursor = this.cursor.clone();
            async move { cursor.next().await }.boxed()
        });

        let outcome = match pending.as_mut().poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };
        this.pending = None;

        match outcome {
            Ok(row) => Poll::Ready(Some(Ok(row))),
            Err(err) if err.is_terminal() => {
                this.done = true;
                Poll::Ready(None)
            }
            Err(err) => {
                this.done = true;
                Poll::Ready(Some(Err(err)))
            }
        }
    }
}

impl<T: Transport> fmt::Debug for Rows<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
