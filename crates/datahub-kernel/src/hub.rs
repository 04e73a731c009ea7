//! The data hub: builds the product tree and serves reads from it.
//!
//! Tree acquisition per product goes tree cache → storage → remote build.
//! A freshly built tree is saved, cached, and only then becomes visible.
//! The assembled root (`root / mission / product / ...`) is published as one
//! immutable snapshot; readers clone the `Arc` and never block builders.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use datahub_types::{Product, ProductId, ProductPath, SEPARATOR};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::LruCache;
use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use crate::remote::{ManifestParser, RemoteSource};
use crate::storage::{ProductStorage, TreeDb};
use crate::vfs::{Directory, Node, RemoteFile};

/// Range cache key: the file's remote address plus the (clamped) range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RangeKey {
    path: ProductPath,
    offset: u64,
    length: u64,
}

/// Orchestrates tree acquisition and cached byte-range reads.
pub struct DataHub {
    remote: Arc<dyn RemoteSource>,
    parser: Arc<dyn ManifestParser>,
    storage: Arc<dyn ProductStorage>,
    config: HubConfig,
    /// Built product trees; every value is a `Node::Directory`.
    trees: Mutex<LruCache<ProductId, Arc<Node>>>,
    ranges: Mutex<LruCache<RangeKey, Arc<Vec<u8>>>>,
    root: RwLock<Option<Arc<Node>>>,
    /// One gate per product currently being acquired.
    in_flight: GateTable,
}

impl std::fmt::Debug for DataHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataHub")
            .field("missions", &self.config.missions)
            .field("trees", &*self.trees.lock())
            .field("ranges", &*self.ranges.lock())
            .field("published", &self.root.read().is_some())
            .finish_non_exhaustive()
    }
}

impl DataHub {
    /// Create a hub persisting trees in SQLite at `config.db_path`.
    pub fn open(
        remote: Arc<dyn RemoteSource>,
        parser: Arc<dyn ManifestParser>,
        config: HubConfig,
    ) -> HubResult<Self> {
        config.validate()?;
        let storage = TreeDb::open(&config.db_path)?;
        info!(db = %config.db_path.display(), "opened tree storage");
        Self::with_storage(remote, parser, config, Arc::new(storage))
    }

    /// Create a hub over an already-open storage backend.
    pub fn with_storage(
        remote: Arc<dyn RemoteSource>,
        parser: Arc<dyn ManifestParser>,
        config: HubConfig,
        storage: Arc<dyn ProductStorage>,
    ) -> HubResult<Self> {
        config.validate()?;
        let trees = LruCache::new(config.tree_capacity()?);
        let ranges = LruCache::new(config.range_capacity()?);
        Ok(Self {
            remote,
            parser,
            storage,
            config,
            trees: Mutex::new(trees),
            ranges: Mutex::new(ranges),
            root: RwLock::new(None),
            in_flight: DashMap::new(),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Build (or reload) every product tree and publish the assembled root.
    #[tracing::instrument(skip(self), name = "hub.get_data")]
    pub async fn get_data(&self) -> HubResult<Arc<Node>> {
        let mut missions = Vec::with_capacity(self.config.missions.len());
        for mission in &self.config.missions {
            let products = self.list_products(mission).await?;
            let mut seen = HashSet::new();
            let mut children = Vec::with_capacity(products.len());

            for product in &products {
                if product.filename.is_empty() || product.filename.contains(SEPARATOR) {
                    warn!(product = %product.id, filename = %product.filename, "unusable product filename, skipping");
                    continue;
                }
                if !seen.insert(product.filename.as_str()) {
                    warn!(product = %product.id, filename = %product.filename, "duplicate product filename, skipping");
                    continue;
                }
                match self.acquire_tree(product).await {
                    Ok(tree) => children.push(tree),
                    Err(HubError::MalformedEntry(e)) => {
                        warn!(product = %product.id, error = %e, "malformed manifest, skipping product");
                    }
                    Err(e) => return Err(e),
                }
            }

            debug!(mission, products = children.len(), "assembled mission");
            missions.push(Node::from(Directory::with_children(mission.as_str(), children)));
        }

        let root = Arc::new(Node::from(Directory::with_children(
            self.config.root_name.as_str(),
            missions,
        )));
        *self.root.write() = Some(Arc::clone(&root));
        info!(missions = self.config.missions.len(), "published root");
        Ok(root)
    }

    /// Read `[offset, offset + length)` of the file at `path`.
    ///
    /// `path` is relative to the root, e.g. `Sentinel-1/S1B_....SAFE/manifest.safe`;
    /// a leading separator is accepted. Ranges are clamped to the file size.
    #[tracing::instrument(skip(self), name = "hub.get_file")]
    pub async fn get_file(&self, path: &str, offset: u64, length: u64) -> HubResult<Vec<u8>> {
        let root = self.published_root().await?;
        let segments = split_path(path);
        let node = match root.as_directory() {
            Some(dir) if !segments.is_empty() => dir.resolve(&segments),
            _ => None,
        };

        match node {
            Some(Node::File(file)) => Ok(file.read_range(offset, length).to_vec()),
            Some(Node::RemoteFile(remote)) => self.read_remote(remote, offset, length).await,
            Some(Node::Directory(_)) => {
                debug!(path, "path is a directory");
                Err(HubError::not_found(path))
            }
            None => {
                debug!(path, "no node at path");
                Err(HubError::not_found(path))
            }
        }
    }

    /// Child names of the directory at `path` (empty path lists the root).
    pub async fn list(&self, path: &str) -> HubResult<Vec<String>> {
        let root = self.published_root().await?;
        let segments = split_path(path);
        let dir = match root.as_directory() {
            Some(dir) if segments.is_empty() => Some(dir),
            Some(dir) => dir.resolve(&segments).and_then(Node::as_directory),
            None => None,
        };
        match dir {
            Some(dir) => Ok(dir.list_children()),
            None => {
                debug!(path, "no directory at path");
                Err(HubError::not_found(path))
            }
        }
    }

    /// Forget the published root and all cached trees.
    ///
    /// Stored trees and cached byte ranges are kept; the next access
    /// re-acquires trees, normally from storage.
    pub fn invalidate(&self) {
        *self.root.write() = None;
        self.trees.lock().clear();
        info!("invalidated published root and tree cache");
    }

    /// The currently published root, if any.
    pub fn published(&self) -> Option<Arc<Node>> {
        self.root.read().clone()
    }

    pub fn cached_trees(&self) -> usize {
        self.trees.lock().len()
    }

    pub fn cached_ranges(&self) -> usize {
        self.ranges.lock().len()
    }

    async fn published_root(&self) -> HubResult<Arc<Node>> {
        let published = self.root.read().clone();
        match published {
            Some(root) => Ok(root),
            None => self.get_data().await,
        }
    }

    /// All products of a mission, fetched page by page.
    async fn list_products(&self, mission: &str) -> HubResult<Vec<Product>> {
        let page_size = self.config.listing_page_size;
        let mut products = Vec::new();
        let mut offset = 0;
        loop {
            let document = self.remote.fetch_listing(mission, offset, page_size).await?;
            let page = self.parser.parse_listing(&document)?;
            let fetched = page.len();
            products.extend(page);
            if fetched < page_size {
                break;
            }
            offset += fetched;
        }
        debug!(mission, products = products.len(), "listed mission");
        Ok(products)
    }

    /// Get a product's tree, building it at most once across concurrent callers.
    #[tracing::instrument(skip(self, product), name = "hub.acquire_tree", fields(product = %product.id))]
    async fn acquire_tree(&self, product: &Product) -> HubResult<Arc<Node>> {
        let cached = self.trees.lock().get(&product.id);
        if let Some(tree) = cached {
            return Ok(tree);
        }

        let slot = InFlight::enter(&self.in_flight, &product.id);
        let _guard = slot.gate.lock().await;
        self.acquire_tree_locked(product).await
    }

    async fn acquire_tree_locked(&self, product: &Product) -> HubResult<Arc<Node>> {
        // Someone else may have finished while we waited on the gate.
        let cached = self.trees.lock().get(&product.id);
        if let Some(tree) = cached {
            debug!("tree built by concurrent caller");
            return Ok(tree);
        }

        let stored = match self.storage.load_tree(&product.id) {
            Ok(Some(tree)) if tree.name() == product.filename => Some(tree),
            Ok(Some(tree)) => {
                warn!(stored = tree.name(), "stored tree name does not match product, rebuilding");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "stored tree unusable, rebuilding");
                None
            }
        };

        let tree = match stored {
            Some(tree) => {
                debug!(children = tree.len(), "loaded tree from storage");
                tree
            }
            None => {
                let tree = self.build_tree(product).await?;
                if let Err(e) = self.storage.save_tree(&product.id, &tree) {
                    warn!(error = %e, "failed to persist tree");
                }
                tree
            }
        };

        let tree = Arc::new(Node::from(tree));
        self.trees.lock().put(product.id.clone(), Arc::clone(&tree));
        Ok(tree)
    }

    async fn build_tree(&self, product: &Product) -> HubResult<Directory> {
        let product_path = product.product_path();
        let document = self.remote.fetch_manifest(&product_path).await?;
        let entries = self.parser.parse_manifest(&document)?;
        let count = entries.len();
        let tree =
            Directory::create_remote_structure(&product_path, product.filename.as_str(), entries)?;
        info!(entries = count, size = tree.total_size(), "built tree from manifest");
        Ok(tree)
    }

    /// Read a range of a remote file through the range cache.
    ///
    /// The declared size from the manifest is trusted: the range is clamped
    /// to it before fetching, so bytes past the declared end (or any bytes of
    /// a file declared empty) are never requested from the remote.
    async fn read_remote(&self, file: &RemoteFile, offset: u64, length: u64) -> HubResult<Vec<u8>> {
        let size = file.declared_size();
        if offset >= size || length == 0 {
            return Ok(Vec::new());
        }
        let key = RangeKey {
            path: file.remote_path(),
            offset,
            length: length.min(size - offset),
        };

        let cached = self.ranges.lock().get(&key);
        if let Some(bytes) = cached {
            debug!(remote = %key.path, "range cache hit");
            return Ok((*bytes).clone());
        }

        let bytes = self
            .remote
            .fetch_range(&key.path, key.offset, key.length)
            .await?;
        debug!(remote = %key.path, len = bytes.len(), "fetched range");
        self.ranges.lock().put(key, Arc::new(bytes.clone()));
        Ok(bytes)
    }
}

type GateTable = DashMap<ProductId, Arc<tokio::sync::Mutex<()>>>;

/// A caller's share of a product's in-flight gate.
///
/// Dropping it removes the table entry once no other caller holds the gate,
/// including when the acquiring future is cancelled mid-build.
struct InFlight<'a> {
    table: &'a GateTable,
    product: &'a ProductId,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn enter(table: &'a GateTable, product: &'a ProductId) -> Self {
        let gate = table.entry(product.clone()).or_default().value().clone();
        Self {
            table,
            product,
            gate,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // Unshared means only the table and this slot hold the gate.
        self.table
            .remove_if(self.product, |_, gate| Arc::strong_count(gate) == 2);
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::remote::{MemoryRemote, TsvParser};
    use crate::storage::MemoryStorage;

    const PRODUCT: &str = "725adbf7";
    const FILENAME: &str = "S1B_IW_SLC.SAFE";

    fn remote() -> Arc<MemoryRemote> {
        let remote = Arc::new(MemoryRemote::new());
        remote.add_listing_record(
            "Sentinel-1",
            format!("{PRODUCT}\tS1B_IW_SLC\t2018-01-22T23:05:33.262Z\t{FILENAME}\tSentinel-1\tSLC\t300"),
        );
        remote.set_manifest(PRODUCT, "100\tsub_dir1/.manifest.xml\n200\tsub_dir1/sub_dir2/xyz\n");
        remote.set_file(
            ProductPath::with_path(PRODUCT, FILENAME, "sub_dir1/sub_dir2/xyz"),
            (0..200u8).collect::<Vec<_>>(),
        );
        remote
    }

    fn hub(remote: Arc<MemoryRemote>) -> DataHub {
        DataHub::with_storage(
            remote,
            Arc::new(TsvParser),
            HubConfig::with_missions(["Sentinel-1"]),
            Arc::new(MemoryStorage::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a//b/"), ["a", "b"]);
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = HubConfig {
            range_cache_capacity: 0,
            ..HubConfig::default()
        };
        let err = DataHub::with_storage(
            Arc::new(MemoryRemote::new()),
            Arc::new(TsvParser),
            config,
            Arc::new(MemoryStorage::new()),
        )
        .unwrap_err();
        assert!(matches!(err, HubError::Config(_)));
    }

    #[tokio::test]
    async fn test_get_data_assembles_root() {
        let hub = hub(remote());
        let root = hub.get_data().await.unwrap();
        assert_eq!(root.name(), "/");

        let product = root
            .as_directory()
            .unwrap()
            .resolve(&["Sentinel-1", FILENAME])
            .unwrap();
        assert_eq!(product.as_directory().unwrap().list_children(), ["sub_dir1"]);
        assert!(Arc::ptr_eq(&hub.published().unwrap(), &root));
    }

    #[tokio::test]
    async fn test_get_file_reads_and_caches_range() {
        let remote = remote();
        let hub = hub(Arc::clone(&remote));
        let path = format!("/Sentinel-1/{FILENAME}/sub_dir1/sub_dir2/xyz");

        assert_eq!(hub.get_file(&path, 10, 3).await.unwrap(), [10, 11, 12]);
        assert_eq!(hub.get_file(&path, 10, 3).await.unwrap(), [10, 11, 12]);
        assert_eq!(remote.range_fetches(), 1);
        assert_eq!(hub.cached_ranges(), 1);
    }

    #[tokio::test]
    async fn test_remote_range_clamped_to_declared_size() {
        let remote = remote();
        let hub = hub(Arc::clone(&remote));
        let path = format!("Sentinel-1/{FILENAME}/sub_dir1/sub_dir2/xyz");

        let tail = hub.get_file(&path, 198, 10).await.unwrap();
        assert_eq!(tail, [198, 199]);
        assert!(hub.get_file(&path, 200, 10).await.unwrap().is_empty());
        assert!(hub.get_file(&path, 0, 0).await.unwrap().is_empty());
        assert_eq!(remote.range_fetches(), 1);
    }

    #[tokio::test]
    async fn test_declared_empty_file_is_never_fetched() {
        let remote = remote();
        remote.set_manifest(PRODUCT, "0\tempty.dat\n");
        remote.set_file(
            ProductPath::with_path(PRODUCT, FILENAME, "empty.dat"),
            vec![7u8; 16],
        );
        let hub = hub(Arc::clone(&remote));

        let path = format!("Sentinel-1/{FILENAME}/empty.dat");
        assert!(hub.get_file(&path, 0, 16).await.unwrap().is_empty());
        assert_eq!(remote.range_fetches(), 0);
        assert_eq!(hub.cached_ranges(), 0);
    }

    #[tokio::test]
    async fn test_get_file_not_found() {
        let hub = hub(remote());
        for path in [
            "",
            "/",
            "Sentinel-1",
            "Sentinel-1/missing",
            "Sentinel-1/S1B_IW_SLC.SAFE/sub_dir1",
        ] {
            let err = hub.get_file(path, 0, 1).await.unwrap_err();
            assert!(err.is_not_found(), "{path:?} gave {err:?}");
        }
    }

    #[tokio::test]
    async fn test_list() {
        let hub = hub(remote());
        assert_eq!(hub.list("/").await.unwrap(), ["Sentinel-1"]);
        assert_eq!(hub.list("Sentinel-1").await.unwrap(), [FILENAME]);
        assert_eq!(
            hub.list(&format!("Sentinel-1/{FILENAME}/sub_dir1")).await.unwrap(),
            [".manifest.xml", "sub_dir2"]
        );
        let leaf = format!("Sentinel-1/{FILENAME}/sub_dir1/.manifest.xml");
        assert!(hub.list(&leaf).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_invalidate_keeps_storage() {
        let remote = remote();
        let hub = hub(Arc::clone(&remote));
        hub.get_data().await.unwrap();
        assert_eq!(hub.cached_trees(), 1);

        hub.invalidate();
        assert!(hub.published().is_none());
        assert_eq!(hub.cached_trees(), 0);

        hub.get_data().await.unwrap();
        assert_eq!(remote.manifest_fetches(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_acquire_releases_gate() {
        let remote = remote();
        let hub = hub(Arc::clone(&remote));
        let product = Product {
            id: ProductId::from(PRODUCT),
            title: "S1B_IW_SLC".into(),
            ingestion_date: "2018-01-22T23:05:33.262Z".into(),
            filename: FILENAME.into(),
            mission: "Sentinel-1".into(),
            product_type: "SLC".into(),
            size: 300,
        };

        remote.set_latency(Some(Duration::from_millis(200)));
        let slow = tokio::time::timeout(Duration::from_millis(20), hub.acquire_tree(&product));
        assert!(slow.await.is_err());
        assert!(hub.in_flight.is_empty());
        assert_eq!(hub.cached_trees(), 0);

        remote.set_latency(None);
        hub.acquire_tree(&product).await.unwrap();
        assert!(hub.in_flight.is_empty());
        assert_eq!(hub.cached_trees(), 1);
    }
}
