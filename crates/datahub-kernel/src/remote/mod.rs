//! Seams to the remote catalog and to the document parser.
//!
//! Neither the wire client nor the manifest format lives in this crate.
//! The hub only depends on these traits:
//!
//! - [`RemoteSource`] - listing, manifest and byte-range fetches
//! - [`ManifestParser`] - turns raw documents into records
//!
//! [`MemoryRemote`] and [`TsvParser`] are small self-contained
//! implementations for tests and local experiments.

mod error;
mod memory;
mod tsv;

use async_trait::async_trait;
use datahub_types::{ManifestEntry, Product, ProductPath};

pub use error::{ParseError, ParseResult, RemoteError, RemoteResult};
pub use memory::MemoryRemote;
pub use tsv::TsvParser;

/// Remote product catalog and download service.
///
/// Implementations own connection handling, authentication, retries and
/// timeouts. Every call is final from the caller's point of view.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch one page of the product listing for a mission.
    ///
    /// Returns a raw document for [`ManifestParser::parse_listing`] holding
    /// at most `count` products starting at `offset`.
    async fn fetch_listing(&self, mission: &str, offset: usize, count: usize)
    -> RemoteResult<Vec<u8>>;

    /// Fetch the raw manifest document of a product.
    async fn fetch_manifest(&self, product: &ProductPath) -> RemoteResult<Vec<u8>>;

    /// Fetch exactly `[offset, offset + length)` of the file at `path`.
    async fn fetch_range(&self, path: &ProductPath, offset: u64, length: u64)
    -> RemoteResult<Vec<u8>>;
}

/// Turns raw catalog documents into structured records.
pub trait ManifestParser: Send + Sync {
    /// Flat `(relative_path, size)` entries of a product manifest.
    fn parse_manifest(&self, document: &[u8]) -> ParseResult<Vec<ManifestEntry>>;

    /// Product summaries of one listing page.
    fn parse_listing(&self, document: &[u8]) -> ParseResult<Vec<Product>>;
}
