//! Parsed catalog records: product summaries and manifest entries.
//!
//! These are the output contract of the manifest/listing parser. The parser
//! itself lives outside this workspace; everything downstream only sees
//! these structs.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use crate::path::ProductPath;

/// One product as returned by a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Ingestion timestamp as reported by the catalog (ISO 8601 text).
    pub ingestion_date: String,
    /// Archive name, e.g. `S1B_IW_SLC__...SAFE`. Used as the directory name.
    pub filename: String,
    pub mission: String,
    pub product_type: String,
    /// Total product size in bytes.
    pub size: u64,
}

impl Product {
    /// Remote address of the product root.
    pub fn product_path(&self) -> ProductPath {
        ProductPath::new(self.id.clone(), self.filename.clone())
    }
}

/// One `(relative_path, size)` line of a product manifest.
///
/// A relative path ending in `/` denotes an explicit (possibly empty)
/// directory rather than a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub size: u64,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// True for trailing-separator entries that name a directory.
    pub fn is_directory(&self) -> bool {
        self.path.ends_with(crate::path::SEPARATOR)
    }
}

impl<P: Into<String>> From<(P, u64)> for ManifestEntry {
    fn from((path, size): (P, u64)) -> Self {
        Self::new(path, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_path_uses_filename() {
        let product = Product {
            id: ProductId::new("63a6c50d-1bba-45eb-a7db-85ecd334e30b"),
            title: "S1B_IW_SLC__1SDV".into(),
            ingestion_date: "2018-01-22T23:06:09.235Z".into(),
            filename: "S1B_IW_SLC__1SDV.SAFE".into(),
            mission: "Sentinel-1".into(),
            product_type: "SLC".into(),
            size: 7_700_000_000,
        };
        assert_eq!(
            product.product_path(),
            ProductPath::new("63a6c50d-1bba-45eb-a7db-85ecd334e30b", "S1B_IW_SLC__1SDV.SAFE")
        );
    }

    #[test]
    fn test_directory_entry_detection() {
        assert!(ManifestEntry::new("empty_sub_dir/", 600).is_directory());
        assert!(!ManifestEntry::new("sub_dir1/.manifest.xml", 500).is_directory());
        let entry: ManifestEntry = ("a/b", 3).into();
        assert_eq!(entry, ManifestEntry::new("a/b", 3));
    }
}
