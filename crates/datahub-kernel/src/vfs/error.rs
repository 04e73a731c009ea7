//! Tree construction errors.

use thiserror::Error;

/// Error raised while building a tree from manifest entries.
///
/// Lookups never fail: a missing path is `None`, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A manifest entry violates the path-segment rule.
    #[error("malformed manifest entry {entry:?}: {reason}")]
    MalformedEntry {
        entry: String,
        reason: &'static str,
    },

    /// A node was given an empty name.
    #[error("node name must not be empty")]
    EmptyName,
}

impl TreeError {
    /// Create a MalformedEntry error.
    pub fn malformed(entry: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedEntry {
            entry: entry.into(),
            reason,
        }
    }
}

/// Tree result type.
pub type TreeResult<T> = Result<T, TreeError>;
