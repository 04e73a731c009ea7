//! Directory nodes and the manifest-driven tree builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use datahub_types::{ManifestEntry, ProductPath, SEPARATOR};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::error::{TreeError, TreeResult};
use super::node::{Node, RemoteFile};
use super::types::DirEntry;

/// Composite node owning its children, keyed and ordered by name.
///
/// Children are held behind `Arc` so published trees can hand out subtrees
/// to concurrent readers without copying. A built directory is never mutated.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DirectoryRepr")]
pub struct Directory {
    name: String,
    children: BTreeMap<String, Arc<Node>>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "node names must be non-empty");
        Self {
            name,
            children: BTreeMap::new(),
        }
    }

    /// Create a directory from already-built children.
    ///
    /// Children are keyed by their own names; a later child with the same
    /// name replaces an earlier one.
    pub fn with_children<I, C>(name: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Node>>,
    {
        let mut dir = Self::new(name);
        for child in children {
            let child = child.into();
            dir.children.insert(child.name().to_string(), child);
        }
        dir
    }

    /// Build the nested tree described by flat manifest entries.
    ///
    /// Every segment but the last becomes (or reuses) a directory; the last
    /// becomes a [`RemoteFile`] addressed by `product_path` plus the
    /// directory prefix walked to reach it. An entry ending in the separator
    /// creates an explicit, possibly empty, directory instead.
    ///
    /// Fails with [`TreeError::EmptyName`] if `name` is empty.
    pub fn create_remote_structure<I, E>(
        product_path: &ProductPath,
        name: impl Into<String>,
        entries: I,
    ) -> TreeResult<Directory>
    where
        I: IntoIterator<Item = E>,
        E: Into<ManifestEntry>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(TreeError::EmptyName);
        }
        let mut root = PendingDir::default();
        for entry in entries {
            root.insert(product_path, &entry.into())?;
        }
        Ok(root.freeze(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a path relative to this directory.
    ///
    /// The first component names a child. Returns `None` for an empty path,
    /// an unknown component, or a walk through a leaf.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let first = path.first()?;
        self.children.get(first.as_ref())?.resolve(path)
    }

    /// Child names in lexicographic order.
    pub fn list_children(&self) -> Vec<String> {
        self.children.keys().cloned().collect()
    }

    /// Child entries (name, kind, size) in lexicographic order.
    pub fn entries(&self) -> Vec<DirEntry> {
        self.children
            .values()
            .map(|child| DirEntry::new(child.name(), child.kind(), child.size()))
            .collect()
    }

    pub fn get_child(&self, name: &str) -> Option<Arc<Node>> {
        self.children.get(name).cloned()
    }

    /// Children in name order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.values().map(|child| &**child)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first, name-ordered walk over all descendants.
    ///
    /// Yields `(relative_path, node)`; this directory itself is not included.
    pub fn walk(&self) -> Walk<'_> {
        let stack = self
            .children
            .values()
            .rev()
            .map(|child| (child.name().to_string(), &**child))
            .collect();
        Walk { stack }
    }

    /// Sum of all leaf sizes below this directory.
    pub fn total_size(&self) -> u64 {
        self.walk().map(|(_, node)| node.size()).sum()
    }
}

/// Iterator returned by [`Directory::walk`].
pub struct Walk<'a> {
    stack: Vec<(String, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (String, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        if let Node::Directory(dir) = node {
            for child in dir.children.values().rev() {
                self.stack
                    .push((format!("{path}{SEPARATOR}{}", child.name()), &**child));
            }
        }
        Some((path, node))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Mutable directory used only while building; frozen into [`Directory`].
#[derive(Default)]
struct PendingDir {
    children: BTreeMap<String, Pending>,
}

enum Pending {
    Dir(PendingDir),
    Leaf(RemoteFile),
}

impl PendingDir {
    fn insert(&mut self, product_path: &ProductPath, entry: &ManifestEntry) -> TreeResult<()> {
        let mut segments: Vec<&str> = entry.path.split(SEPARATOR).collect();
        let explicit_dir = entry.is_directory();
        if explicit_dir {
            segments.pop();
        }
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(TreeError::malformed(&entry.path, "empty path segment"));
        }

        let leaf = if explicit_dir { None } else { segments.pop() };

        let mut current = self;
        let mut address = product_path.clone();
        for segment in segments {
            address = address.join(segment);
            let slot = current
                .children
                .entry(segment.to_string())
                .or_insert_with(|| Pending::Dir(PendingDir::default()));
            current = match slot {
                Pending::Dir(dir) => dir,
                Pending::Leaf(_) => {
                    return Err(TreeError::malformed(
                        &entry.path,
                        "directory segment collides with a file",
                    ));
                }
            };
        }

        if let Some(name) = leaf {
            if let Some(Pending::Dir(_)) = current.children.get(name) {
                return Err(TreeError::malformed(
                    &entry.path,
                    "file collides with a directory",
                ));
            }
            current.children.insert(
                name.to_string(),
                Pending::Leaf(RemoteFile::new(name, address, entry.size)),
            );
        }
        Ok(())
    }

    fn freeze(self, name: String) -> Directory {
        let children = self
            .children
            .into_iter()
            .map(|(child_name, pending)| {
                let node = match pending {
                    Pending::Dir(dir) => Node::Directory(dir.freeze(child_name.clone())),
                    Pending::Leaf(leaf) => Node::RemoteFile(leaf),
                };
                (child_name, Arc::new(node))
            })
            .collect();
        Directory { name, children }
    }
}

// ============================================================================
// Serialization
// ============================================================================

// Children go over the wire as a sequence of tagged nodes; the name index is
// rebuilt (and checked) on the way back in.

impl Serialize for Directory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Directory", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("children", &ChildSeq(&self.children))?;
        state.end()
    }
}

struct ChildSeq<'a>(&'a BTreeMap<String, Arc<Node>>);

impl Serialize for ChildSeq<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values().map(|child| &**child))
    }
}

#[derive(Deserialize)]
#[serde(rename = "Directory")]
struct DirectoryRepr {
    name: String,
    children: Vec<Node>,
}

impl TryFrom<DirectoryRepr> for Directory {
    type Error = String;

    fn try_from(repr: DirectoryRepr) -> Result<Self, Self::Error> {
        if repr.name.is_empty() {
            return Err("directory with empty name".to_string());
        }
        let mut children = BTreeMap::new();
        for child in repr.children {
            if child.name().is_empty() {
                return Err(format!("child with empty name in {:?}", repr.name));
            }
            let child_name = child.name().to_string();
            if children.insert(child_name.clone(), Arc::new(child)).is_some() {
                return Err(format!("duplicate child {child_name:?} in {:?}", repr.name));
            }
        }
        Ok(Directory {
            name: repr.name,
            children,
        })
    }
}
