//! The cursor state machine: buffering, fetch coalescing and closing.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use serde_json::Value;

use super::state::{CursorState, Fetched, Mode, PendingFetch, Phase};
use crate::config::CursorOptions;
use crate::protocol::{classify, CursorVariant, Response, ResponseType, Token};
use crate::transport::Transport;
use crate::{Error, QueryErrorKind, Result, UsageError};

/// A lazily fetched sequence of rows for one running query.
///
/// A `Cursor` is a cheap handle: clones share the same token, buffer and
/// in-flight fetch, so several tasks can pull from one cursor at once
/// without ever sending two continuation requests for the same batch.
///
/// # Consumption
///
/// Rows can be consumed through exactly one family of adapters at a time:
/// - pull: [`next`](Self::next), [`to_vec`](Self::to_vec),
///   [`each`](Self::each), [`each_async`](Self::each_async),
///   [`rows`](Self::rows)
/// - push: [`stream`](Self::stream)
///
/// Mixing them fails with [`UsageError::MixedAccess`].
///
/// # Cancellation
///
/// [`close`](Self::close) stops the query on the server. Dropping the last
/// handle of a cursor that has not been exhausted does the same.
pub struct Cursor<T: Transport> {
    pub(crate) inner: Arc<Inner<T>>,
}

pub(crate) struct Inner<T: Transport> {
    token: Token,
    transport: Arc<T>,
    query: Value,
    pub(crate) options: CursorOptions,
    state: Mutex<CursorState>,
}

impl<T: Transport> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Cursor<T> {
    /// Create a cursor for a query that was already sent under `token`.
    ///
    /// The first batch is requested in the background right away, so an
    /// error in it is captured even if nobody consumes the cursor yet; it
    /// surfaces on the first consumption attempt.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(transport: Arc<T>, token: Token, query: Value, options: CursorOptions) -> Self {
        let cursor = Self {
            inner: Arc::new(Inner {
                token,
                transport,
                query,
                options,
                state: Mutex::new(CursorState::new()),
            }),
        };

        {
            let mut state = cursor.inner.state();
            let pending = cursor.spawn_fetch(false);
            state.pending = Some(pending);
        }

        cursor
    }

    /// The token this cursor reads.
    pub fn token(&self) -> Token {
        self.inner.token
    }

    /// The query this cursor was created for.
    pub fn query(&self) -> &Value {
        &self.inner.query
    }

    /// The cursor variant, once the first batch has arrived.
    pub fn variant(&self) -> Option<CursorVariant> {
        self.inner.state().variant
    }

    /// Whether rows of the latest batch include intermediate feed states.
    pub fn includes_states(&self) -> bool {
        self.inner.state().include_states
    }

    /// Which family of adapters is consuming the cursor.
    pub fn mode(&self) -> Mode {
        self.inner.state().mode
    }

    /// Where the cursor is in its fetch lifecycle.
    pub fn phase(&self) -> Phase {
        self.inner.state().phase
    }

    /// Whether the cursor was closed.
    pub fn is_closed(&self) -> bool {
        self.inner.state().phase == Phase::Closed
    }

    /// The profile sent with the most recent batch that carried one.
    pub fn profile(&self) -> Option<Value> {
        self.inner.state().profile.clone()
    }

    /// Stop the cursor.
    ///
    /// Sends a stop request if the connection is open, then rejects every
    /// further consumption attempt. A fetch still in flight is allowed to
    /// finish; its rows are discarded and its waiters see
    /// [`Error::Cancelled`]. Calling `close` again has no effect.
    pub fn close(&self) {
        {
            let mut state = self.inner.state();
            if state.phase == Phase::Closed {
                return;
            }
            state.mark_closed();
            state.deferred = None;
        }

        self.inner.send_stop();
    }

    /// Read the next row, fetching a new batch when the current one runs dry.
    ///
    /// This is the primitive every adapter is built on; it does not check
    /// the consumer mode.
    pub(crate) async fn advance(&self) -> Result<Value> {
        loop {
            let pending = {
                let mut state = self.inner.state();

                if let Some(err) = state.deferred.take() {
                    state.mark_closed();
                    return Err(err);
                }
                match state.phase {
                    Phase::Closed => return Err(Error::Cancelled),
                    Phase::Exhausted => return Err(UsageError::CursorClosed.into()),
                    _ => {}
                }

                if let Some(row) = state.batch.next_row() {
                    return Ok(row);
                }

                match state.pending.clone() {
                    Some(pending) => pending,
                    None if state.batch.has_more() => {
                        if let Err(err) = self.inner.transport.send_continue(self.inner.token) {
                            state.mark_closed();
                            return Err(err);
                        }
                        let pending = self.spawn_fetch(true);
                        state.pending = Some(pending.clone());
                        state.phase = Phase::Fetching;
                        pending
                    }
                    None => {
                        state.phase = Phase::Exhausted;
                        return Err(Error::EndOfData);
                    }
                }
            };

            pending.await;
        }
    }

    /// Wait for the first batch and return the cursor variant.
    ///
    /// An initial fetch failure is surfaced here and closes the cursor.
    pub(crate) async fn classified(&self) -> Result<CursorVariant> {
        loop {
            let pending = {
                let mut state = self.inner.state();
                if let Some(err) = state.deferred.take() {
                    state.mark_closed();
                    return Err(err);
                }
                if let Some(variant) = state.variant {
                    return Ok(variant);
                }
                match (&state.pending, state.phase) {
                    (_, Phase::Closed) => return Err(Error::Cancelled),
                    (Some(pending), _) => pending.clone(),
                    (None, _) => return Err(UsageError::CursorClosed.into()),
                }
            };

            pending.await;
        }
    }

    /// Start reading the next batch on a background task.
    ///
    /// The returned handle only resolves once the response has been applied
    /// to the cursor state. It holds a weak reference so a cursor dropped
    /// mid-fetch is not kept alive by its own fetch.
    fn spawn_fetch(&self, continuation: bool) -> PendingFetch {
        let token = self.inner.token;
        let transport = Arc::clone(&self.inner.transport);
        tracing::trace!(%token, continuation, "fetching batch");

        let task = tokio::spawn(async move { transport.read_next_batch(token).await });

        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(join) => Err(Error::Transport(format!("fetch task failed: {join}"))),
            };
            if let Some(inner) = inner.upgrade() {
                inner.complete_fetch(outcome);
            }
        }
        .boxed()
        .shared()
    }
}

impl<T: Transport> Inner<T> {
    pub(crate) fn state(&self) -> MutexGuard<'_, CursorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete_fetch(&self, outcome: Result<Response>) {
        let fetched = outcome.and_then(|response| self.decode_response(response));

        let mut state = self.state();
        state.pending = None;
        if state.phase == Phase::Closed {
            tracing::trace!(token = %self.token, "discarding batch for closed cursor");
            return;
        }

        match fetched {
            Ok(fetched) => {
                tracing::trace!(
                    token = %self.token,
                    rows = fetched.rows.len(),
                    has_more = fetched.has_more,
                    "batch received"
                );
                state.apply(fetched);
            }
            Err(err) => {
                tracing::debug!(token = %self.token, error = %err, "fetch failed");
                state.deferred = Some(err);
            }
        }
    }

    /// Turn one response into a batch, or into the error it reports.
    fn decode_response(&self, response: Response) -> Result<Fetched> {
        let (variant, include_states) = classify(response.response_type, &response.notes);

        if !response.response_type.is_success() {
            return Err(match response.response_type.query_error_kind() {
                Some(kind) => self.query_error(kind, response),
                None => Error::Protocol {
                    code: response.response_type.code(),
                    token: self.token,
                },
            });
        }

        let decoder = self.options.decoder();
        let mut rows = response
            .rows
            .into_iter()
            .map(|raw| decoder.decode(raw))
            .collect::<Result<Vec<_>>>()?;

        // An atom holding an array is read element by element.
        if response.response_type == ResponseType::SuccessAtom
            && matches!(rows.as_slice(), [Value::Array(_)])
        {
            if let Some(Value::Array(items)) = rows.pop() {
                rows = items;
            }
        }

        Ok(Fetched {
            variant,
            include_states,
            rows,
            has_more: response.response_type == ResponseType::SuccessPartial,
            profile: response.profile,
        })
    }

    fn query_error(&self, kind: QueryErrorKind, response: Response) -> Error {
        Error::Query {
            kind,
            message: response
                .error_message()
                .unwrap_or_else(|| "unknown error".to_string()),
            error_type: response.error_type,
            backtrace: response.backtrace,
            query: self.query.to_string(),
        }
    }

    fn send_stop(&self) {
        if !self.transport.is_open() {
            return;
        }
        if let Err(err) = self.transport.send_stop(self.token) {
            tracing::debug!(token = %self.token, error = %err, "stop request failed");
        }
    }
}

impl<T: Transport> Drop for Inner<T> {
    fn drop(&mut self) {
        let phase = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .phase;
        if !matches!(phase, Phase::Exhausted | Phase::Closed) {
            self.send_stop();
        }
    }
}

impl<T: Transport> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("Cursor")
            .field("token", &self.inner.token)
            .field("phase", &state.phase)
            .field("mode", &state.mode)
            .field("variant", &state.variant)
            .finish_non_exhaustive()
    }
}
