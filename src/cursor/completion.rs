//! Callback-style row handlers for [`Cursor::each_async`](crate::Cursor::each_async).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::{Error, Result};

/// Reports the outcome of handling one row.
///
/// Given to handlers adapted with [`with_completion`]. Dropping it without
/// reporting fails the loop with [`Error::CompletionDropped`].
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Result<()>>,
}

impl Completion {
    fn channel() -> (Self, Completed) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, Completed { rx })
    }

    /// The row was handled; continue with the next one.
    pub fn ok(self) {
        self.finish(Ok(()));
    }

    /// The row could not be handled; stop the loop with `error`.
    pub fn fail(self, error: impl Into<Box<dyn std::error::Error + Send + Sync>>) {
        self.finish(Err(Error::handler(error)));
    }

    /// Report an outcome directly.
    pub fn finish(self, outcome: Result<()>) {
        // The loop may already be gone; nothing is waiting then.
        let _ = self.tx.send(outcome);
    }
}

/// Future resolving to the outcome a [`Completion`] reports.
#[derive(Debug)]
pub struct Completed {
    rx: oneshot::Receiver<Result<()>>,
}

impl Future for Completed {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::CompletionDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Adapt a handler that reports through an explicit [`Completion`] into one
/// that returns a future.
///
/// The handler may report synchronously or hand the completion to another
/// task and report later.
///
/// # Example
///
/// ```ignore
/// use libcursor::with_completion;
///
/// cursor
///     .each_async(with_completion(|row, done| {
///         tokio::spawn(async move {
///             store(row).await;
///             done.ok();
///         });
///     }))
///     .await?;
/// ```
pub fn with_completion<F>(mut handler: F) -> impl FnMut(Value) -> Completed
where
    F: FnMut(Value, Completion),
{
    move |row| {
        let (completion, completed) = Completion::channel();
        handler(row, completion);
        completed
    }
}
