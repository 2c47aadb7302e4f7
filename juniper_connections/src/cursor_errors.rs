use base64::DecodeError;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors raised while decoding a cursor handed back by a client.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum CursorError {
    /// The cursor does not decode to `offset` or `tag:offset`.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// The cursor is well formed but was issued by a different connection.
    #[error("Invalid cursor: issued for `{found}`, expected `{expected}`")]
    TypeMismatch { expected: String, found: String },
}

impl From<DecodeError> for CursorError {
    fn from(err: DecodeError) -> Self {
        CursorError::InvalidCursor(format!("not base64 ({err})"))
    }
}

impl From<FromUtf8Error> for CursorError {
    fn from(_: FromUtf8Error) -> Self {
        CursorError::InvalidCursor("not valid UTF-8".to_string())
    }
}
