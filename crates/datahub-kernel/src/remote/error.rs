//! Errors reported by the remote and parser collaborators.

use std::io;
use thiserror::Error;

/// Failure reported by a [`RemoteSource`](super::RemoteSource).
///
/// Retries and timeouts are the source's business; by the time one of these
/// reaches the hub it is final for that call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Service unreachable, auth refused, or retries exhausted.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The remote does not know the requested product or file.
    #[error("not found on remote: {0}")]
    NotFound(String),

    /// The remote refused the byte range.
    #[error("invalid range {offset}+{length} for {path}")]
    InvalidRange {
        path: String,
        offset: u64,
        length: u64,
    },

    /// Transport-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RemoteError {
    /// Create an Unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Remote result type.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure turning a raw document into records.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A record could not be parsed.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl ParseError {
    /// Create a Syntax error.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Parser result type.
pub type ParseResult<T> = Result<T, ParseError>;
