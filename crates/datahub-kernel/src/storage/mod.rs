//! Persistence for built product trees.
//!
//! Trees are encoded with postcard. Node variants are serde enum variants,
//! so the encoding is tagged: a `File` can never come back as a
//! `RemoteFile`. A blob that fails to decode is reported as
//! [`StorageError::Corrupt`]; callers treat that as a cache miss.

mod memory;
mod sqlite;

use datahub_types::ProductId;
use thiserror::Error;

use crate::vfs::Directory;

pub use memory::MemoryStorage;
pub use sqlite::TreeDb;

/// Version stamped next to every stored tree.
pub const FORMAT_VERSION: i64 = 1;

/// Storage error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Stored tree cannot be decoded (or was written by another format version).
    #[error("corrupt tree for {product}: {reason}")]
    Corrupt { product: String, reason: String },

    /// Tree could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] postcard::Error),

    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Create a Corrupt error.
    pub fn corrupt(product: &ProductId, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            product: product.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the stored data is unusable and should be rebuilt.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Corrupt { .. })
    }
}

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable store for built trees, keyed by product.
pub trait ProductStorage: Send + Sync {
    /// Load a previously saved tree. `Ok(None)` when nothing is stored.
    fn load_tree(&self, product: &ProductId) -> StorageResult<Option<Directory>>;

    /// Save (or replace) the tree for a product.
    fn save_tree(&self, product: &ProductId, tree: &Directory) -> StorageResult<()>;

    /// Delete a stored tree. Returns `true` if one was removed.
    fn remove_tree(&self, product: &ProductId) -> StorageResult<bool>;

    /// Products with a stored tree, in id order.
    fn list_products(&self) -> StorageResult<Vec<ProductId>>;
}

/// Encode a tree for storage.
pub fn encode_tree(tree: &Directory) -> StorageResult<Vec<u8>> {
    Ok(postcard::to_stdvec(tree)?)
}

/// Decode a stored tree, mapping any failure to [`StorageError::Corrupt`].
pub fn decode_tree(product: &ProductId, format: i64, blob: &[u8]) -> StorageResult<Directory> {
    if format != FORMAT_VERSION {
        return Err(StorageError::corrupt(
            product,
            format!("unsupported format version {format}"),
        ));
    }
    postcard::from_bytes(blob).map_err(|e| StorageError::corrupt(product, e.to_string()))
}
