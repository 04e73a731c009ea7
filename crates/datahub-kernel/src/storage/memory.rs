//! In-memory tree storage.
//!
//! Stores encoded blobs, not live trees, so a save/load cycle exercises the
//! same encoding as [`TreeDb`](super::TreeDb). All data is lost when dropped.

use dashmap::DashMap;
use datahub_types::ProductId;

use super::{FORMAT_VERSION, ProductStorage, StorageResult, decode_tree, encode_tree};
use crate::vfs::Directory;

/// Tree storage backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: DashMap<ProductId, (i64, Vec<u8>)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw blob under an explicit format version.
    ///
    /// Bypasses encoding; used to inject damaged entries.
    pub fn insert_raw(&self, product: ProductId, format: i64, blob: Vec<u8>) {
        self.blobs.insert(product, (format, blob));
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl ProductStorage for MemoryStorage {
    fn load_tree(&self, product: &ProductId) -> StorageResult<Option<Directory>> {
        match self.blobs.get(product) {
            Some(entry) => {
                let (format, blob) = entry.value();
                decode_tree(product, *format, blob).map(Some)
            }
            None => Ok(None),
        }
    }

    fn save_tree(&self, product: &ProductId, tree: &Directory) -> StorageResult<()> {
        let blob = encode_tree(tree)?;
        self.blobs.insert(product.clone(), (FORMAT_VERSION, blob));
        Ok(())
    }

    fn remove_tree(&self, product: &ProductId) -> StorageResult<bool> {
        Ok(self.blobs.remove(product).is_some())
    }

    fn list_products(&self) -> StorageResult<Vec<ProductId>> {
        let mut products: Vec<ProductId> = self.blobs.iter().map(|e| e.key().clone()).collect();
        products.sort();
        Ok(products)
    }
}
