//! Tree nodes.
//!
//! The variant set is closed: a node is a [`Directory`], a materialized
//! [`File`], or a [`RemoteFile`] that only knows where its bytes live.
//! Nodes are deliberately not `Clone`; subtrees are shared through `Arc`.

use std::fmt::{self, Write as _};

use datahub_types::ProductPath;
use serde::{Deserialize, Serialize};

use super::directory::Directory;
use super::types::NodeKind;

/// Indentation added per nesting level by [`Node::render`].
const INDENT: &str = "  ";

/// A node in the virtual filesystem tree.
///
/// Equality is structural: same variant, same name, and the same payload
/// (children compared recursively, content, or address + declared size).
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Directory(Directory),
    File(File),
    RemoteFile(RemoteFile),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => dir.name(),
            Node::File(file) => file.name(),
            Node::RemoteFile(remote) => remote.name(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Directory(_) => NodeKind::Directory,
            Node::File(_) => NodeKind::File,
            Node::RemoteFile(_) => NodeKind::RemoteFile,
        }
    }

    /// Content length for files, declared size for remote files, 0 for directories.
    pub fn size(&self) -> u64 {
        match self {
            Node::Directory(_) => 0,
            Node::File(file) => file.content.len() as u64,
            Node::RemoteFile(remote) => remote.size,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Node::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Node::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_remote_file(&self) -> Option<&RemoteFile> {
        match self {
            Node::RemoteFile(remote) => Some(remote),
            _ => None,
        }
    }

    /// Resolve a path whose first component names this node.
    ///
    /// A single matching component yields the node itself. Longer paths
    /// continue into directory children; leaves are not traversable.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        if first.as_ref() != self.name() {
            return None;
        }
        if rest.is_empty() {
            return Some(self);
        }
        match self {
            Node::Directory(dir) => dir.resolve(rest),
            Node::File(_) | Node::RemoteFile(_) => None,
        }
    }

    /// Human-readable recursive dump, indented by `indent_level` units.
    pub fn render(&self, indent_level: usize) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, indent_level);
        out
    }

    fn write_tree(&self, out: &mut String, level: usize) {
        for _ in 0..level {
            out.push_str(INDENT);
        }
        // Writing into a String cannot fail.
        let _ = match self {
            Node::Directory(dir) => writeln!(out, "{}/", dir.name()),
            Node::File(file) => writeln!(out, "{} [{} B]", file.name, file.content.len()),
            Node::RemoteFile(remote) => writeln!(
                out,
                "{} -> {} [{} B]",
                remote.name, remote.product_path, remote.size
            ),
        };
        if let Node::Directory(dir) = self {
            for child in dir.children() {
                child.write_tree(out, level + 1);
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

impl From<Directory> for Node {
    fn from(dir: Directory) -> Self {
        Node::Directory(dir)
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Node::File(file)
    }
}

impl From<RemoteFile> for Node {
    fn from(remote: RemoteFile) -> Self {
        Node::RemoteFile(remote)
    }
}

/// Leaf holding its content in memory.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    name: String,
    content: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "node names must be non-empty");
        Self {
            name,
            content: content.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Bytes in `[offset, offset + length)`, clamped to the content.
    ///
    /// Reading past the end yields whatever is available, possibly nothing.
    pub fn read_range(&self, offset: u64, length: u64) -> &[u8] {
        let len = self.content.len();
        let start = usize::try_from(offset).map_or(len, |o| o.min(len));
        let end = usize::try_from(length)
            .ok()
            .and_then(|l| start.checked_add(l))
            .map_or(len, |e| e.min(len));
        &self.content[start..end]
    }
}

/// Leaf whose bytes live in a remote product.
///
/// `product_path` addresses the directory containing the file; the file's
/// own address is [`RemoteFile::remote_path`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    name: String,
    product_path: ProductPath,
    size: u64,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>, product_path: ProductPath, size: u64) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "node names must be non-empty");
        Self {
            name,
            product_path,
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product_path(&self) -> &ProductPath {
        &self.product_path
    }

    pub fn declared_size(&self) -> u64 {
        self.size
    }

    /// Address of this file's bytes on the remote.
    pub fn remote_path(&self) -> ProductPath {
        self.product_path.join(&self.name)
    }
}
