//! Typed options for cursor behavior.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a server pseudo-type is handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Convert into a plain value (timestamps, byte arrays, group lists).
    #[default]
    Native,
    /// Pass the tagged object through unchanged.
    Raw,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Native => write!(f, "native"),
            Format::Raw => write!(f, "raw"),
        }
    }
}

/// Default capacity of the push stream queue.
pub const DEFAULT_STREAM_BUFFER: usize = 64;
