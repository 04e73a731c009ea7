//! Read-only virtual filesystem tree.
//!
//! Key components:
//!
//! - [`Node`] - Closed sum type over the three node variants
//! - [`Directory`] - Composite node; builds itself from manifest entries
//! - [`File`] - Leaf with materialized content
//! - [`RemoteFile`] - Leaf that only knows where its bytes live
//!
//! ## Design Decisions
//!
//! - **Immutable once built**: trees are constructed in isolation and then
//!   shared through `Arc`, so readers never observe a half-built tree.
//! - **Absence is not an error**: lookups return `Option`; only building
//!   from malformed manifest entries fails.
//! - **No I/O in nodes**: remote bytes are fetched by the hub, never stored
//!   on a node.

mod directory;
mod error;
mod node;
mod types;

pub use directory::{Directory, Walk};
pub use error::{TreeError, TreeResult};
pub use node::{File, Node, RemoteFile};
pub use types::{DirEntry, NodeKind};
