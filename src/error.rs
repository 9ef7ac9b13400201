use serde_json::Value;

use crate::protocol::{CursorVariant, ErrorType, Token};

/// Errors that can occur when consuming a cursor.
///
/// Errors are organized by category:
/// - Usage errors: the caller used the cursor in a way it does not allow
/// - Terminal conditions: natural end of data, or cancellation by `close()`
/// - Query errors: the server rejected or failed the query
/// - Protocol errors: the server sent something this client does not understand
/// - Transport errors: the connection failed underneath the cursor
/// - Handler errors: a caller-supplied callback failed
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Usage errors
    // -------------------------------------------------------------------------
    /// The cursor was used in a way its current mode does not allow.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// Invalid options provided to the builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -------------------------------------------------------------------------
    // Terminal conditions
    // -------------------------------------------------------------------------
    /// The cursor has no more rows.
    ///
    /// This is the benign end of a finite result. Only [`Cursor::next`] reports
    /// it; the collecting and looping adapters stop silently instead.
    ///
    /// [`Cursor::next`]: crate::Cursor::next
    #[error("no more rows in the cursor")]
    EndOfData,

    /// The cursor was closed while a fetch was in flight.
    #[error("cursor was closed while a fetch was in flight")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Server errors
    // -------------------------------------------------------------------------
    /// The server reported a client, compile or runtime error for the query.
    #[error("{kind}: {message}")]
    Query {
        kind: QueryErrorKind,
        message: String,
        /// Finer classification of runtime errors, when the server sent one.
        error_type: Option<ErrorType>,
        /// Path to the failing term inside the query.
        backtrace: Vec<Value>,
        /// The query that produced the error, serialized for diagnostics.
        query: String,
    },

    /// The server answered with a response type a cursor cannot handle.
    #[error("unexpected response type {code} for token {token}")]
    Protocol { code: i64, token: Token },

    // -------------------------------------------------------------------------
    // Transport errors
    // -------------------------------------------------------------------------
    /// The shared connection was closed underneath the cursor.
    #[error("connection closed")]
    ConnectionClosed,

    /// The transport failed for a reason it could only describe as text.
    #[error("transport error: {0}")]
    Transport(String),

    /// IO error on the underlying connection.
    ///
    /// Lets [`Transport`](crate::Transport) implementors propagate socket
    /// errors with `?`.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// Failed to parse a response from the wire.
    #[error("failed to parse response: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value decoder could not convert a raw protocol value.
    #[error("failed to decode value: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Handler errors
    // -------------------------------------------------------------------------
    /// A caller-supplied row handler failed.
    #[error("row handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A row handler dropped its [`Completion`](crate::Completion) without
    /// reporting an outcome.
    #[error("row handler dropped its completion without reporting")]
    CompletionDropped,
}

/// Ways a caller can misuse a cursor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsageError {
    /// Pull-style access was attempted while a push stream is bound, or the
    /// other way around.
    #[error("cannot mix pull access with bound push listeners")]
    MixedAccess,

    /// The cursor was closed or has been exhausted.
    #[error("cursor is closed")]
    CursorClosed,

    /// A feed was asked to collect all of its rows.
    #[error("cannot collect a {variant} into a vec: feeds never end")]
    UnboundedFeed { variant: CursorVariant },
}

/// The category of a server-reported query error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// The client sent something the server could not accept.
    Client,
    /// The query failed to compile.
    Compile,
    /// The query failed while running.
    Runtime,
}

impl std::fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryErrorKind::Client => write!(f, "client error"),
            QueryErrorKind::Compile => write!(f, "compile error"),
            QueryErrorKind::Runtime => write!(f, "runtime error"),
        }
    }
}

/// A specialized Result type for cursor operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error raised by a caller-supplied row handler.
    pub fn handler(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(source.into())
    }

    /// Create a JSON parse error with context.
    pub fn json_parse(source: serde_json::Error, raw: &str) -> Self {
        Self::JsonParse {
            message: format!(
                "at position {}: {}",
                source.column(),
                raw.chars().take(100).collect::<String>()
            ),
            source,
        }
    }

    /// Check if this is the natural end of the cursor.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::EndOfData)
    }

    /// Check if this error came from closing the cursor mid-fetch.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if this error only signals that the cursor is done.
    ///
    /// Terminal errors are absorbed by every adapter except [`Cursor::next`].
    ///
    /// [`Cursor::next`]: crate::Cursor::next
    pub fn is_terminal(&self) -> bool {
        self.is_end_of_data() || self.is_cancelled()
    }

    /// Check if this error is a caller mistake.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_) | Error::InvalidConfig(_))
    }

    /// Check if the server reported this error for the query.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::Query { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonParse {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<UsageError>();
    }

    #[test]
    fn terminal_detection() {
        assert!(Error::EndOfData.is_terminal());
        assert!(Error::Cancelled.is_terminal());
        assert!(!Error::ConnectionClosed.is_terminal());
        assert!(!Error::Usage(UsageError::CursorClosed).is_terminal());
        assert!(!Error::Protocol {
            code: 99,
            token: Token::new(1)
        }
        .is_terminal());
    }

    #[test]
    fn usage_detection() {
        assert!(Error::from(UsageError::MixedAccess).is_usage());
        assert!(Error::InvalidConfig("bad".into()).is_usage());
        assert!(!Error::EndOfData.is_usage());
    }

    #[test]
    fn query_error_display() {
        let err = Error::Query {
            kind: QueryErrorKind::Runtime,
            message: "division by zero".into(),
            error_type: Some(ErrorType::QueryLogic),
            backtrace: vec![],
            query: "[1,[27,[1,0]]]".into(),
        };
        assert!(err.is_query_error());
        assert_eq!(err.to_string(), "runtime error: division by zero");
    }

    #[test]
    fn usage_error_display() {
        let err: Error = UsageError::UnboundedFeed {
            variant: CursorVariant::Feed,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "cannot collect a feed into a vec: feeds never end"
        );
        assert_eq!(
            Error::from(UsageError::MixedAccess).to_string(),
            "cannot mix pull access with bound push listeners"
        );
    }

    #[test]
    fn handler_wraps_any_error() {
        let err = Error::handler("row rejected");
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(err.to_string(), "row handler failed: row rejected");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(matches!(Error::handler(io), Error::Handler(_)));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::JsonParse { .. }));
    }

    #[test]
    fn json_parse_truncates_raw_input() {
        let raw = "x".repeat(500);
        let json_err = serde_json::from_str::<serde_json::Value>(&raw).unwrap_err();
        let err = Error::json_parse(json_err, &raw);
        if let Error::JsonParse { message, .. } = err {
            assert!(message.len() < 150);
        } else {
            panic!("Expected JsonParse");
        }
    }

    #[test]
    fn socket_errors_convert_with_question_mark() {
        fn read_frame() -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "peer reset",
            ))
        }
        fn next_batch() -> Result<Vec<u8>> {
            Ok(read_frame()?)
        }

        let err = next_batch().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_terminal());
        assert_eq!(err.to_string(), "IO error: peer reset");
    }
}
