//! Configuration for cursors.
//!
//! This module provides:
//!
//! - [`CursorOptions`] and [`CursorOptionsBuilder`] for configuring a cursor
//! - [`Format`] for choosing how server pseudo-types are decoded
//!
//! # Example
//!
//! ```
//! use libcursor::config::{CursorOptions, Format};
//!
//! let options = CursorOptions::builder()
//!     .stream_buffer(128)
//!     .group_format(Format::Raw)
//!     .build()
//!     .unwrap();
//! ```

pub mod builder;
pub mod options;

pub use builder::{CursorOptions, CursorOptionsBuilder};
pub use options::{Format, DEFAULT_STREAM_BUFFER};
