//! Listing types handed to front-ends.
//!
//! These carry just enough to build attribute records (kind + size) without
//! exposing the node tree itself.

use serde::{Deserialize, Serialize};

/// Node variant, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Composite node with named children.
    Directory,
    /// Leaf with materialized content.
    File,
    /// Leaf backed by a remote product.
    RemoteFile,
}

impl NodeKind {
    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Returns true for either leaf variant.
    pub fn is_leaf(&self) -> bool {
        !self.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: NodeKind,
    /// Size in bytes: content length, declared size, or 0 for directories.
    pub size: u64,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: NodeKind, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind() {
        assert!(NodeKind::Directory.is_dir());
        assert!(!NodeKind::Directory.is_leaf());
        assert!(NodeKind::File.is_leaf());
        assert!(NodeKind::RemoteFile.is_leaf());
    }

    #[test]
    fn test_dir_entry() {
        let entry = DirEntry::new("xyz", NodeKind::RemoteFile, 200);
        assert_eq!(entry.name, "xyz");
        assert!(entry.kind.is_leaf());
        assert_eq!(entry.size, 200);
    }
}
