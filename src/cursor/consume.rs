//! Pull-style consumption: single rows, bulk drain and callback loops.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::machine::Cursor;
use crate::transport::Transport;
use crate::{Error, Result, UsageError};

impl<T: Transport> Cursor<T> {
    /// Fetch the next row.
    ///
    /// Unlike every other adapter, `next` reports the end of the cursor as
    /// [`Error::EndOfData`]; after that, and after [`close`](Self::close),
    /// it fails with [`UsageError::CursorClosed`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// loop {
    ///     match cursor.next().await {
    ///         Ok(row) => println!("{row}"),
    ///         Err(err) if err.is_end_of_data() => break,
    ///         Err(err) => return Err(err),
    ///     }
    /// }
    /// ```
    pub async fn next(&self) -> Result<Value> {
        self.enter_pull()?;
        self.advance().await
    }

    /// Fetch the next row and deserialize it.
    pub async fn next_as<D: DeserializeOwned>(&self) -> Result<D> {
        let row = self.next().await?;
        Ok(serde_json::from_value(row)?)
    }

    /// Collect every remaining row.
    ///
    /// Feeds never end, so they are rejected with
    /// [`UsageError::UnboundedFeed`] before any row is read. A rejected call
    /// leaves the consumer mode untouched, so a push stream can still be
    /// bound to the feed.
    pub async fn to_vec(&self) -> Result<Vec<Value>> {
        self.inner.state().check_pull()?;
        let variant = self.classified().await?;
        if variant.is_feed() {
            return Err(UsageError::UnboundedFeed { variant }.into());
        }
        self.enter_pull()?;

        let mut rows = Vec::new();
        let mut failure = None;
        self.drive(|row| match row {
            Ok(row) => {
                rows.push(row);
                true
            }
            Err(err) => {
                failure = Some(err);
                false
            }
        })
        .await;

        match failure {
            Some(err) => Err(err),
            None => Ok(rows),
        }
    }

    /// Collect every remaining row and deserialize each one.
    pub async fn to_vec_as<D: DeserializeOwned>(&self) -> Result<Vec<D>> {
        self.to_vec()
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(Error::from))
            .collect()
    }

    /// Call `callback` for every row until it returns `false`.
    ///
    /// The end of the cursor stops the loop silently. Any other error is
    /// passed to `callback`; the cursor is closed by then, so the loop ends
    /// after that call. Only usage errors are returned.
    pub async fn each<F>(&self, callback: F) -> Result<()>
    where
        F: FnMut(Result<Value>) -> bool,
    {
        self.enter_pull()?;
        self.drive(callback).await;
        Ok(())
    }

    /// Like [`each`](Self::each), then call `on_finish` however the loop
    /// ended.
    pub async fn each_then<F, D>(&self, callback: F, on_finish: D) -> Result<()>
    where
        F: FnMut(Result<Value>) -> bool,
        D: FnOnce(),
    {
        self.enter_pull()?;
        self.drive(callback).await;
        on_finish();
        Ok(())
    }

    /// Await `handler` for every row, one at a time.
    ///
    /// The loop stops at the first error. The end of the cursor and
    /// cancellation end it successfully; any other error, including one
    /// returned by `handler`, is returned.
    ///
    /// Handlers that report through a callback can be adapted with
    /// [`with_completion`](crate::with_completion).
    pub async fn each_async<F, Fut>(&self, handler: F) -> Result<()>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.enter_pull()?;
        match self.drive_async(handler).await {
            Err(err) if err.is_terminal() => Ok(()),
            outcome => outcome,
        }
    }

    /// Like [`each_async`](Self::each_async), but every error that ends the
    /// loop is handed to `on_final`, which may swallow it by returning
    /// `Ok(())` or propagate it.
    pub async fn each_async_with<F, Fut, E>(&self, handler: F, on_final: E) -> Result<()>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = Result<()>>,
        E: FnOnce(Error) -> Result<()>,
    {
        self.enter_pull()?;
        match self.drive_async(handler).await {
            Err(err) => on_final(err),
            Ok(()) => Ok(()),
        }
    }

    fn enter_pull(&self) -> Result<()> {
        self.inner.state().enter_pull()?;
        Ok(())
    }

    /// The callback loop every bulk and callback adapter shares.
    async fn drive<F>(&self, mut callback: F)
    where
        F: FnMut(Result<Value>) -> bool,
    {
        loop {
            let keep_going = match self.advance().await {
                Ok(row) => callback(Ok(row)),
                Err(err) if err.is_terminal() => return,
                Err(err) => callback(Err(err)),
            };
            if !keep_going {
                return;
            }
        }
    }

    async fn drive_async<F, Fut>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        loop {
            let row = self.advance().await?;
            handler(row).await?;
        }
    }
}
