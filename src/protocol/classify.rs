//! Response classification.

use std::fmt;

use super::response::{Note, ResponseType};

/// What kind of result a cursor is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorVariant {
    /// A single value, possibly an array to iterate.
    Atom,
    /// A finite sequence delivered in batches.
    Cursor,
    /// Change notifications for a sequence.
    Feed,
    /// Change notifications for a single value.
    AtomFeed,
    /// Change notifications for an ordered, limited sequence.
    OrderByLimitFeed,
    /// Several feeds merged into one.
    UnionedFeed,
}

impl CursorVariant {
    /// Check if this variant never ends on its own.
    pub fn is_feed(self) -> bool {
        matches!(
            self,
            CursorVariant::Feed
                | CursorVariant::AtomFeed
                | CursorVariant::OrderByLimitFeed
                | CursorVariant::UnionedFeed
        )
    }
}

impl fmt::Display for CursorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorVariant::Atom => write!(f, "atom"),
            CursorVariant::Cursor => write!(f, "cursor"),
            CursorVariant::Feed => write!(f, "feed"),
            CursorVariant::AtomFeed => write!(f, "atom feed"),
            CursorVariant::OrderByLimitFeed => write!(f, "order-by-limit feed"),
            CursorVariant::UnionedFeed => write!(f, "unioned feed"),
        }
    }
}

/// Classify a response into a cursor variant and whether rows include
/// intermediate states.
///
/// Atoms are never feeds, so their notes are ignored. Otherwise the notes
/// are folded over a starting point of `(Cursor, true)`; a later feed note
/// overrides an earlier one and unknown notes are skipped.
pub fn classify(response_type: ResponseType, notes: &[Note]) -> (CursorVariant, bool) {
    if response_type == ResponseType::SuccessAtom {
        return (CursorVariant::Atom, false);
    }

    notes
        .iter()
        .fold((CursorVariant::Cursor, true), |(variant, states), note| {
            match note {
                Note::SequenceFeed => (CursorVariant::Feed, states),
                Note::AtomFeed => (CursorVariant::AtomFeed, states),
                Note::OrderByLimitFeed => (CursorVariant::OrderByLimitFeed, states),
                Note::UnionedFeed => (CursorVariant::UnionedFeed, states),
                Note::IncludesStates => (variant, true),
                Note::Unknown(_) => (variant, states),
            }
        })
}
