//! Push-style consumption with backpressure.
//!
//! A background pump pulls rows from the cursor and pushes them into a
//! bounded queue; the consumer drains the queue through [`futures::Stream`].
//! A full queue blocks the pump, a paused stream parks it.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::machine::Cursor;
use super::state::Mode;
use crate::observer::ErrorObserver;
use crate::transport::Transport;
use crate::Result;

/// Rows of a cursor pushed through a bounded queue.
///
/// Created by [`Cursor::stream`]. While the stream is bound, pull-style
/// access to the cursor fails with
/// [`UsageError::MixedAccess`](crate::UsageError::MixedAccess).
///
/// # Termination
///
/// The stream ends when the cursor runs out of rows or is closed. Any other
/// error also ends it; it is reported to the stream's [`ErrorObserver`] if
/// one was registered, and dropped otherwise.
///
/// # Cancellation
///
/// Dropping a `RowStream` will:
/// 1. Stop the background pump task
/// 2. Close the cursor
pub struct RowStream<T: Transport> {
    cursor: Cursor<T>,
    rx: mpsc::Receiver<Value>,
    emitting: watch::Sender<bool>,
    task_handle: Option<JoinHandle<()>>,
}

impl<T: Transport> Cursor<T> {
    /// Bind a push stream to the cursor.
    ///
    /// Errors other than the end of the cursor are dropped; use
    /// [`stream_with_observer`](Self::stream_with_observer) to see them.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn stream(&self) -> Result<RowStream<T>> {
        self.stream_with_observer(None)
    }

    /// Bind a push stream that reports the error ending it to `observer`.
    pub fn stream_with_observer(
        &self,
        observer: Option<Arc<dyn ErrorObserver>>,
    ) -> Result<RowStream<T>> {
        self.inner.state().enter_emit()?;

        let (tx, rx) = mpsc::channel(self.inner.options.stream_buffer());
        let (emitting, emitting_rx) = watch::channel(true);
        let task_handle = tokio::spawn(pump(self.clone(), tx, emitting_rx, observer));

        Ok(RowStream {
            cursor: self.clone(),
            rx,
            emitting,
            task_handle: Some(task_handle),
        })
    }
}

/// Background loop that moves rows from the cursor into the queue.
async fn pump<T: Transport>(
    cursor: Cursor<T>,
    tx: mpsc::Sender<Value>,
    mut emitting: watch::Receiver<bool>,
    observer: Option<Arc<dyn ErrorObserver>>,
) {
    loop {
        if emitting.wait_for(|on| *on).await.is_err() {
            // Stream dropped while paused
            return;
        }

        match cursor.advance().await {
            Ok(row) => {
                if tx.send(row).await.is_err() {
                    return;
                }
            }
            Err(err) if err.is_terminal() => return,
            Err(err) => {
                match observer {
                    Some(observer) => observer.on_error(&err),
                    None => tracing::debug!(
                        token = %cursor.token(),
                        error = %err,
                        "stream error dropped, no observer registered"
                    ),
                }
                return;
            }
        }
    }
}

impl<T: Transport> RowStream<T> {
    /// Stop pulling new rows. Rows already queued can still be read.
    ///
    /// While paused the cursor is idle, so pull-style access is allowed
    /// again; resuming then fails.
    pub fn pause(&self) {
        {
            let mut state = self.cursor.inner.state();
            if state.mode == Mode::Emitting {
                state.mode = Mode::Idle;
            }
        }
        self.emitting.send_replace(false);
    }

    /// Restart the pump after [`pause`](Self::pause).
    pub fn resume(&self) -> Result<()> {
        self.cursor.inner.state().enter_emit()?;
        self.emitting.send_replace(true);
        Ok(())
    }

    /// Whether the pump is paused.
    pub fn is_paused(&self) -> bool {
        !*self.emitting.borrow()
    }

    /// The cursor this stream reads.
    pub fn cursor(&self) -> &Cursor<T> {
        &self.cursor
    }
}

impl<T: Transport> Stream for RowStream<T> {
    type Item = Value;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T: Transport> Drop for RowStream<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
        self.cursor.close();
    }
}

impl<T: Transport> fmt::Debug for RowStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("cursor", &self.cursor)
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}
