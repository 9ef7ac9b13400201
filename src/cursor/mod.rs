//! Streaming result cursors.
//!
//! This module turns the batches a server delivers for one query into a
//! single lazily produced sequence of rows. The main types are:
//!
//! - [`Cursor`] - the state machine that buffers batches and fetches more
//! - [`Rows`] - the rows as a pull-driven async stream
//! - [`RowStream`] - the rows pushed through a bounded queue, with pause and resume
//!
//! # Overview
//!
//! ```text
//! adapter ──▶ advance() ──▶ buffer hit ──────────────────────────▶ row
//!                 │
//!                 └──▶ buffer miss ──▶ transport ──▶ decoder ──▶ classifier
//!                                                                   │
//!                      retry buffer read ◀── replace batch ◀────────┘
//! ```
//!
//! Only one fetch is ever in flight per cursor. Every caller that runs past
//! the end of the buffer while it is pending waits on the same handle.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use libcursor::{Cursor, CursorOptions, Token};
//!
//! let cursor = Cursor::new(Arc::clone(&connection), Token::new(1), query, CursorOptions::default());
//! for row in cursor.to_vec().await? {
//!     println!("{row}");
//! }
//! ```
//!
//! # Terminal conditions
//!
//! [`Cursor::next`] reports the natural end of rows as
//! [`Error::EndOfData`](crate::Error::EndOfData). Every other adapter treats
//! it, and [`Error::Cancelled`](crate::Error::Cancelled), as a normal end.

mod completion;
mod consume;
mod emit;
mod machine;
mod rows;
mod state;

pub use completion::{with_completion, Completed, Completion};
pub use emit::RowStream;
pub use machine::Cursor;
pub use rows::Rows;
pub use state::{Mode, Phase};
