//! Wire response types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, QueryErrorKind, Result};

/// Connection-scoped identifier for one running query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub u64);

impl Token {
    /// Create a token from its raw value.
    pub fn new(id: u64) -> Self {
        Token(id)
    }

    /// Get the raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Token {
    fn from(id: u64) -> Self {
        Token(id)
    }
}

/// Response type code sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ResponseType {
    /// A single value.
    SuccessAtom,
    /// The final batch of a sequence.
    SuccessSequence,
    /// A batch with more to follow.
    SuccessPartial,
    /// Answer to a noreply-wait request.
    WaitComplete,
    /// Answer to a server-info request.
    ServerInfo,
    /// The client sent a malformed request.
    ClientError,
    /// The query failed to compile.
    CompileError,
    /// The query failed while running.
    RuntimeError,
    /// A code this client does not know.
    Unknown(i64),
}

impl ResponseType {
    /// The numeric wire code.
    pub fn code(self) -> i64 {
        match self {
            ResponseType::SuccessAtom => 1,
            ResponseType::SuccessSequence => 2,
            ResponseType::SuccessPartial => 3,
            ResponseType::WaitComplete => 4,
            ResponseType::ServerInfo => 5,
            ResponseType::ClientError => 16,
            ResponseType::CompileError => 17,
            ResponseType::RuntimeError => 18,
            ResponseType::Unknown(code) => code,
        }
    }

    /// Check if this code carries rows for a cursor.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            ResponseType::SuccessAtom | ResponseType::SuccessSequence | ResponseType::SuccessPartial
        )
    }

    /// The kind of query error this code reports, if it reports one.
    pub fn query_error_kind(self) -> Option<QueryErrorKind> {
        match self {
            ResponseType::ClientError => Some(QueryErrorKind::Client),
            ResponseType::CompileError => Some(QueryErrorKind::Compile),
            ResponseType::RuntimeError => Some(QueryErrorKind::Runtime),
            _ => None,
        }
    }
}

impl From<i64> for ResponseType {
    fn from(code: i64) -> Self {
        match code {
            1 => ResponseType::SuccessAtom,
            2 => ResponseType::SuccessSequence,
            3 => ResponseType::SuccessPartial,
            4 => ResponseType::WaitComplete,
            5 => ResponseType::ServerInfo,
            16 => ResponseType::ClientError,
            17 => ResponseType::CompileError,
            18 => ResponseType::RuntimeError,
            other => ResponseType::Unknown(other),
        }
    }
}

impl From<ResponseType> for i64 {
    fn from(t: ResponseType) -> Self {
        t.code()
    }
}

/// Metadata note attached to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Note {
    SequenceFeed,
    AtomFeed,
    OrderByLimitFeed,
    UnionedFeed,
    IncludesStates,
    /// A note this client does not know; ignored when classifying.
    Unknown(i64),
}

impl From<i64> for Note {
    fn from(code: i64) -> Self {
        match code {
            1 => Note::SequenceFeed,
            2 => Note::AtomFeed,
            3 => Note::OrderByLimitFeed,
            4 => Note::UnionedFeed,
            5 => Note::IncludesStates,
            other => Note::Unknown(other),
        }
    }
}

impl From<Note> for i64 {
    fn from(note: Note) -> Self {
        match note {
            Note::SequenceFeed => 1,
            Note::AtomFeed => 2,
            Note::OrderByLimitFeed => 3,
            Note::UnionedFeed => 4,
            Note::IncludesStates => 5,
            Note::Unknown(code) => code,
        }
    }
}

/// Finer classification of a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorType {
    Internal,
    ResourceLimit,
    QueryLogic,
    NonExistence,
    OpFailed,
    OpIndeterminate,
    User,
    PermissionError,
    Unknown(i64),
}

impl From<i64> for ErrorType {
    fn from(code: i64) -> Self {
        match code {
            1_000_000 => ErrorType::Internal,
            2_000_000 => ErrorType::ResourceLimit,
            3_000_000 => ErrorType::QueryLogic,
            3_100_000 => ErrorType::NonExistence,
            4_100_000 => ErrorType::OpFailed,
            4_200_000 => ErrorType::OpIndeterminate,
            5_000_000 => ErrorType::User,
            6_000_000 => ErrorType::PermissionError,
            other => ErrorType::Unknown(other),
        }
    }
}

impl From<ErrorType> for i64 {
    fn from(t: ErrorType) -> Self {
        match t {
            ErrorType::Internal => 1_000_000,
            ErrorType::ResourceLimit => 2_000_000,
            ErrorType::QueryLogic => 3_000_000,
            ErrorType::NonExistence => 3_100_000,
            ErrorType::OpFailed => 4_100_000,
            ErrorType::OpIndeterminate => 4_200_000,
            ErrorType::User => 5_000_000,
            ErrorType::PermissionError => 6_000_000,
            ErrorType::Unknown(code) => code,
        }
    }
}

/// One decoded response for a token.
///
/// Field names follow the compact wire form: `t` type, `r` rows,
/// `n` notes, `e` error type, `b` backtrace, `p` profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "t")]
    pub response_type: ResponseType,
    #[serde(rename = "r", default)]
    pub rows: Vec<Value>,
    #[serde(rename = "n", default)]
    pub notes: Vec<Note>,
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(rename = "b", default, skip_serializing_if = "Vec::is_empty")]
    pub backtrace: Vec<Value>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

impl Response {
    /// Create a response with the given type and rows and nothing else.
    pub fn new(response_type: ResponseType, rows: Vec<Value>) -> Self {
        Self {
            response_type,
            rows,
            notes: Vec::new(),
            error_type: None,
            backtrace: Vec::new(),
            profile: None,
        }
    }

    /// A batch with more to follow.
    pub fn partial(rows: Vec<Value>) -> Self {
        Self::new(ResponseType::SuccessPartial, rows)
    }

    /// The final batch of a sequence.
    pub fn sequence(rows: Vec<Value>) -> Self {
        Self::new(ResponseType::SuccessSequence, rows)
    }

    /// A single value.
    pub fn atom(value: Value) -> Self {
        Self::new(ResponseType::SuccessAtom, vec![value])
    }

    /// An error response carrying `message` as its only row.
    pub fn error(response_type: ResponseType, message: impl Into<String>) -> Self {
        Self::new(response_type, vec![Value::String(message.into())])
    }

    /// Replace the notes.
    pub fn with_notes(mut self, notes: impl IntoIterator<Item = Note>) -> Self {
        self.notes = notes.into_iter().collect();
        self
    }

    /// Parse a response from its JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::json_parse(e, raw))
    }

    /// Parse a response from raw JSON bytes.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| Error::json_parse(e, &String::from_utf8_lossy(raw)))
    }

    /// The server message of an error response.
    pub fn error_message(&self) -> Option<String> {
        match self.rows.first()? {
            Value::String(message) => Some(message.clone()),
            other => Some(other.to_string()),
        }
    }
}
