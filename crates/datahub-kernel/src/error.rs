//! Hub error types.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::{ParseError, RemoteError};
use crate::storage::StorageError;
use crate::vfs::TreeError;

/// Errors surfaced by [`DataHub`](crate::DataHub) operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Path does not name a node, or names the wrong kind of node.
    #[error("not found: {0}")]
    NotFound(String),

    /// A manifest could not be turned into a tree.
    #[error(transparent)]
    MalformedEntry(#[from] TreeError),

    /// The remote failed; nothing was cached for the failed request.
    #[error("remote request failed: {0}")]
    RemoteUnavailable(#[from] RemoteError),

    /// A listing or manifest document could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persistent storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The hub configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl HubError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HubError::NotFound(_))
    }
}

impl From<HubError> for io::Error {
    fn from(e: HubError) -> Self {
        match e {
            HubError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            HubError::MalformedEntry(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            HubError::RemoteUnavailable(RemoteError::Io(e)) => e,
            HubError::RemoteUnavailable(e) => io::Error::other(e),
            HubError::Parse(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            HubError::Storage(e) => io::Error::other(e),
            HubError::Config(e) => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}

/// Hub result type.
pub type HubResult<T> = Result<T, HubError>;
