//! Cursor state: fetch phase, consumer mode and the current batch.

use futures::future::{BoxFuture, Shared};
use serde_json::Value;

use crate::protocol::CursorVariant;
use crate::{Error, UsageError};

/// Where the cursor is in its fetch lifecycle.
///
/// ```text
/// Initializing ──▶ Ready ⇄ Fetching ──▶ Exhausted
///       └────────────┴────────┴───────▶ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The first batch has not arrived yet.
    Initializing,
    /// Rows can be read from the current batch.
    Ready,
    /// A continuation is in flight.
    Fetching,
    /// The last batch has been read.
    Exhausted,
    /// The cursor was closed or failed.
    Closed,
}

/// Which family of adapters is consuming the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Nothing has consumed a row yet, or the push stream is paused.
    #[default]
    Idle,
    /// Pull, bulk, callback or iterator access.
    Pulling,
    /// A push stream is bound and running.
    Emitting,
    /// The cursor was closed.
    Closed,
}

/// One fetched set of rows and a read position into it.
#[derive(Debug)]
pub(crate) struct Batch {
    rows: Vec<Value>,
    position: usize,
    has_more: bool,
}

impl Batch {
    /// The empty batch a cursor starts with, waiting for its first response.
    pub(crate) fn awaiting_first() -> Self {
        Self {
            rows: Vec::new(),
            position: 0,
            has_more: true,
        }
    }

    /// Replace the whole batch and rewind.
    pub(crate) fn replace(&mut self, rows: Vec<Value>, has_more: bool) {
        self.rows = rows;
        self.position = 0;
        self.has_more = has_more;
    }

    /// Take the row at the read position, if any.
    pub(crate) fn next_row(&mut self) -> Option<Value> {
        let row = self.rows.get_mut(self.position).map(std::mem::take)?;
        self.position += 1;
        Some(row)
    }

    pub(crate) fn has_more(&self) -> bool {
        self.has_more
    }
}

/// The single in-flight fetch; every waiter polls a clone of the same handle.
pub(crate) type PendingFetch = Shared<BoxFuture<'static, ()>>;

/// A decoded, classified response ready to replace the current batch.
pub(crate) struct Fetched {
    pub(crate) variant: CursorVariant,
    pub(crate) include_states: bool,
    pub(crate) rows: Vec<Value>,
    pub(crate) has_more: bool,
    pub(crate) profile: Option<Value>,
}

pub(crate) struct CursorState {
    pub(crate) phase: Phase,
    pub(crate) mode: Mode,
    pub(crate) variant: Option<CursorVariant>,
    pub(crate) include_states: bool,
    pub(crate) batch: Batch,
    pub(crate) pending: Option<PendingFetch>,
    /// A fetch failure nobody has observed yet.
    pub(crate) deferred: Option<Error>,
    pub(crate) profile: Option<Value>,
}

impl CursorState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Initializing,
            mode: Mode::Idle,
            variant: None,
            include_states: false,
            batch: Batch::awaiting_first(),
            pending: None,
            deferred: None,
            profile: None,
        }
    }

    /// Install a fetched batch. The variant is fixed by the first batch.
    pub(crate) fn apply(&mut self, fetched: Fetched) {
        self.variant.get_or_insert(fetched.variant);
        self.include_states = fetched.include_states;
        self.batch.replace(fetched.rows, fetched.has_more);
        if fetched.profile.is_some() {
            self.profile = fetched.profile;
        }
        self.phase = Phase::Ready;
    }

    pub(crate) fn mark_closed(&mut self) {
        self.phase = Phase::Closed;
        self.mode = Mode::Closed;
        self.pending = None;
    }

    /// Whether consumers may still read from the cursor.
    pub(crate) fn is_consumable(&self) -> bool {
        !matches!(self.phase, Phase::Exhausted | Phase::Closed)
    }

    /// Whether a pull-style adapter would be admitted, without claiming the
    /// cursor for it.
    pub(crate) fn check_pull(&self) -> Result<(), UsageError> {
        if !self.is_consumable() {
            return Err(UsageError::CursorClosed);
        }
        match self.mode {
            Mode::Emitting => Err(UsageError::MixedAccess),
            Mode::Closed => Err(UsageError::CursorClosed),
            Mode::Idle | Mode::Pulling => Ok(()),
        }
    }

    /// Admit a pull-style adapter.
    pub(crate) fn enter_pull(&mut self) -> Result<(), UsageError> {
        self.check_pull()?;
        self.mode = Mode::Pulling;
        Ok(())
    }

    /// Admit a push stream, either on bind or on resume.
    pub(crate) fn enter_emit(&mut self) -> Result<(), UsageError> {
        if !self.is_consumable() {
            return Err(UsageError::CursorClosed);
        }
        match self.mode {
            Mode::Pulling => Err(UsageError::MixedAccess),
            Mode::Closed => Err(UsageError::CursorClosed),
            Mode::Idle | Mode::Emitting => {
                self.mode = Mode::Emitting;
                Ok(())
            }
        }
    }
}
