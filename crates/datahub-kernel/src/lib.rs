//! # datahub-kernel
//!
//! Read-only virtual filesystem over remote, manifest-described data products.
//!
//! The hub lists products per mission, turns each product manifest into a
//! tree of [`Directory`], [`File`] and [`RemoteFile`] nodes, persists the
//! built trees, and serves byte-range reads through a bounded cache:
//!
//! ```text
//! /                          root (HubConfig::root_name)
//! └── Sentinel-1/            one directory per mission
//!     └── S1B_....SAFE/      one directory per product, named by filename
//!         ├── manifest.safe  RemoteFile -> id:S1B_....SAFE
//!         └── measurement/
//! ```
//!
//! The wire client and the document format stay outside: implement
//! [`RemoteSource`] and [`ManifestParser`] and hand them to [`DataHub`].

pub mod cache;
pub mod config;
pub mod error;
pub mod hub;
pub mod remote;
pub mod storage;
pub mod vfs;

pub use cache::LruCache;
pub use config::{ConfigError, HubConfig};
pub use error::{HubError, HubResult};
pub use hub::DataHub;
pub use remote::{
    ManifestParser, MemoryRemote, ParseError, ParseResult, RemoteError, RemoteResult,
    RemoteSource, TsvParser,
};
pub use storage::{MemoryStorage, ProductStorage, StorageError, StorageResult, TreeDb};
pub use vfs::{DirEntry, Directory, File, Node, NodeKind, RemoteFile, TreeError, TreeResult};

pub use datahub_types::{ManifestEntry, Product, ProductId, ProductPath};
