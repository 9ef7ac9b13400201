//! Cursor options and builder.
//!
//! # Example
//!
//! ```
//! use libcursor::config::{CursorOptions, Format};
//!
//! let options = CursorOptions::builder()
//!     .stream_buffer(16)
//!     .time_format(Format::Raw)
//!     .build()
//!     .unwrap();
//! assert_eq!(options.stream_buffer(), 16);
//! ```

use std::fmt;
use std::sync::Arc;

use super::options::{Format, DEFAULT_STREAM_BUFFER};
use crate::decode::{PseudoTypeDecoder, ValueDecoder};
use crate::{Error, Result};

/// Options shared by every adapter of one cursor.
///
/// Use [`CursorOptions::builder()`] to customize; [`Default`] gives the
/// native pseudo-type decoder and a 64-row push queue.
#[derive(Clone)]
pub struct CursorOptions {
    pub(crate) stream_buffer: usize,
    pub(crate) decoder: Arc<dyn ValueDecoder>,
}

impl CursorOptions {
    /// Create a new builder for CursorOptions.
    pub fn builder() -> CursorOptionsBuilder {
        CursorOptionsBuilder::default()
    }

    /// Capacity of the push stream queue.
    pub fn stream_buffer(&self) -> usize {
        self.stream_buffer
    }

    /// The decoder applied to every raw row.
    pub fn decoder(&self) -> &Arc<dyn ValueDecoder> {
        &self.decoder
    }
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            stream_buffer: DEFAULT_STREAM_BUFFER,
            decoder: Arc::new(PseudoTypeDecoder::default()),
        }
    }
}

impl fmt::Debug for CursorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorOptions")
            .field("stream_buffer", &self.stream_buffer)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CursorOptions`].
///
/// The options are validated when [`build()`](CursorOptionsBuilder::build)
/// is called.
#[derive(Clone, Default)]
pub struct CursorOptionsBuilder {
    stream_buffer: Option<usize>,
    time_format: Format,
    group_format: Format,
    binary_format: Format,
    decoder: Option<Arc<dyn ValueDecoder>>,
}

impl CursorOptionsBuilder {
    /// Capacity of the bounded queue between the push stream's pump and its
    /// consumer.
    pub fn stream_buffer(mut self, rows: usize) -> Self {
        self.stream_buffer = Some(rows);
        self
    }

    /// How `TIME` values are decoded.
    pub fn time_format(mut self, format: Format) -> Self {
        self.time_format = format;
        self
    }

    /// How `GROUPED_DATA` values are decoded.
    pub fn group_format(mut self, format: Format) -> Self {
        self.group_format = format;
        self
    }

    /// How `BINARY` values are decoded.
    pub fn binary_format(mut self, format: Format) -> Self {
        self.binary_format = format;
        self
    }

    /// Use a custom decoder instead of the pseudo-type decoder.
    ///
    /// When set, the format options are ignored.
    pub fn decoder(mut self, decoder: Arc<dyn ValueDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the stream buffer is zero.
    pub fn build(self) -> Result<CursorOptions> {
        let stream_buffer = self.stream_buffer.unwrap_or(DEFAULT_STREAM_BUFFER);
        if stream_buffer == 0 {
            return Err(Error::InvalidConfig(
                "stream_buffer must be at least 1".into(),
            ));
        }

        let decoder = self.decoder.unwrap_or_else(|| {
            Arc::new(PseudoTypeDecoder::new(
                self.time_format,
                self.group_format,
                self.binary_format,
            ))
        });

        Ok(CursorOptions {
            stream_buffer,
            decoder,
        })
    }
}

impl fmt::Debug for CursorOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorOptionsBuilder")
            .field("stream_buffer", &self.stream_buffer)
            .field("time_format", &self.time_format)
            .field("group_format", &self.group_format)
            .field("binary_format", &self.binary_format)
            .field("custom_decoder", &self.decoder.is_some())
            .finish()
    }
}
