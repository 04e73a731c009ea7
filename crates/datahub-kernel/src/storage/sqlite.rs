//! SQLite persistence for built product trees.
//!
//! One row per product: the postcard-encoded tree plus its format version.

use std::path::Path;

use datahub_types::ProductId;
use parking_lot::Mutex;
use rusqlite::{Connection, params};

use super::{FORMAT_VERSION, ProductStorage, StorageResult, decode_tree, encode_tree};
use crate::vfs::Directory;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trees (
    product_id TEXT PRIMARY KEY,
    format INTEGER NOT NULL,
    tree BLOB NOT NULL,
    saved_at INTEGER DEFAULT (unixepoch())
);
"#;

/// Database handle for tree persistence.
///
/// The connection sits behind a mutex so one handle can be shared by
/// concurrent hub requests.
pub struct TreeDb {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for TreeDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeDb").finish_non_exhaustive()
    }
}

impl TreeDb {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Store a raw blob under an explicit format version.
    ///
    /// Bypasses encoding; used to inject damaged rows.
    pub fn save_raw(&self, product: &ProductId, format: i64, blob: &[u8]) -> StorageResult<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO trees (product_id, format, tree) VALUES (?1, ?2, ?3)",
            params![product.as_str(), format, blob],
        )?;
        Ok(())
    }

    /// Unix time of the last save for a product.
    pub fn saved_at(&self, product: &ProductId) -> StorageResult<Option<i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT saved_at FROM trees WHERE product_id = ?1")?;
        let mut rows = stmt.query(params![product.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(None),
        }
    }
}

impl ProductStorage for TreeDb {
    fn load_tree(&self, product: &ProductId) -> StorageResult<Option<Directory>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT format, tree FROM trees WHERE product_id = ?1")?;
        let mut rows = stmt.query(params![product.as_str()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let format: i64 = row.get(0)?;
        let blob: Vec<u8> = row.get(1)?;
        decode_tree(product, format, &blob).map(Some)
    }

    fn save_tree(&self, product: &ProductId, tree: &Directory) -> StorageResult<()> {
        let blob = encode_tree(tree)?;
        self.save_raw(product, FORMAT_VERSION, &blob)
    }

    fn remove_tree(&self, product: &ProductId) -> StorageResult<bool> {
        let removed = self.conn.lock().execute(
            "DELETE FROM trees WHERE product_id = ?1",
            params![product.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn list_products(&self) -> StorageResult<Vec<ProductId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT product_id FROM trees ORDER BY product_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut products = Vec::new();
        for id in rows {
            products.push(ProductId::new(id?));
        }
        Ok(products)
    }
}
