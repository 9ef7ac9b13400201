//! Protocol types for query responses.
//!
//! The server answers every continuation request with one JSON response per
//! token. This module defines those responses and the classifier that maps
//! them onto cursor variants.
//!
//! # Example
//!
//! ```
//! use libcursor::protocol::{classify, CursorVariant, Response};
//!
//! let json = r#"{"t": 3, "r": [{"id": 1}], "n": [1]}"#;
//! let response = Response::from_json(json).unwrap();
//!
//! let (variant, _) = classify(response.response_type, &response.notes);
//! assert_eq!(variant, CursorVariant::Feed);
//! ```

mod classify;
mod response;

pub use classify::{classify, CursorVariant};
pub use response::{ErrorType, Note, Response, ResponseType, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Response>();
        assert_send_sync::<CursorVariant>();
        assert_send_sync::<Token>();
    }

    #[test]
    fn roundtrip_response() {
        let original = Response {
            response_type: ResponseType::RuntimeError,
            rows: vec![serde_json::json!("boom")],
            notes: vec![Note::IncludesStates],
            error_type: Some(ErrorType::OpFailed),
            backtrace: vec![serde_json::json!(2)],
            profile: Some(serde_json::json!([{"description": "eval"}])),
        };

        let json = serde_json::to_string(&original).unwrap();
        let parsed = Response::from_json(&json).unwrap();
        assert_eq!(original, parsed);
    }
}
