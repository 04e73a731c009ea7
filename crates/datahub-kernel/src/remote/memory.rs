//! In-memory remote source.
//!
//! Used for testing and local experiments. Documents and file bytes are
//! registered up front; fetch counters make caching behavior observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use datahub_types::{ProductId, ProductPath};
use parking_lot::RwLock;

use super::RemoteSource;
use super::error::{RemoteError, RemoteResult};

/// Remote source backed by in-memory maps.
///
/// Listings are stored as records per mission; a listing page is the
/// requested slice of records joined by newlines. Thread-safe via internal
/// `RwLock`s.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    listings: RwLock<HashMap<String, Vec<String>>>,
    manifests: RwLock<HashMap<ProductId, Vec<u8>>>,
    files: RwLock<HashMap<ProductPath, Vec<u8>>>,
    offline: AtomicBool,
    latency: RwLock<Option<Duration>>,
    listing_fetches: AtomicUsize,
    manifest_fetches: AtomicUsize,
    range_fetches: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one listing record (one line of a listing document) to a mission.
    pub fn add_listing_record(&self, mission: impl Into<String>, record: impl Into<String>) {
        self.listings
            .write()
            .entry(mission.into())
            .or_default()
            .push(record.into());
    }

    /// Register the manifest document of a product.
    pub fn set_manifest(&self, product: impl Into<ProductId>, document: impl Into<Vec<u8>>) {
        self.manifests
            .write()
            .insert(product.into(), document.into());
    }

    /// Register the bytes of a file, addressed by its full remote path.
    pub fn set_file(&self, path: ProductPath, content: impl Into<Vec<u8>>) {
        self.files.write().insert(path, content.into());
    }

    /// Make every subsequent fetch fail with [`RemoteError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every fetch by `latency` (to widen race windows in tests).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    pub fn listing_fetches(&self) -> usize {
        self.listing_fetches.load(Ordering::SeqCst)
    }

    pub fn manifest_fetches(&self) -> usize {
        self.manifest_fetches.load(Ordering::SeqCst)
    }

    pub fn range_fetches(&self) -> usize {
        self.range_fetches.load(Ordering::SeqCst)
    }

    async fn simulate_network(&self, counter: &AtomicUsize) -> RemoteResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::unavailable("memory remote is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for MemoryRemote {
    async fn fetch_listing(
        &self,
        mission: &str,
        offset: usize,
        count: usize,
    ) -> RemoteResult<Vec<u8>> {
        self.simulate_network(&self.listing_fetches).await?;
        let listings = self.listings.read();
        let page = match listings.get(mission) {
            Some(records) => records
                .iter()
                .skip(offset)
                .take(count)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        };
        Ok(page.into_bytes())
    }

    async fn fetch_manifest(&self, product: &ProductPath) -> RemoteResult<Vec<u8>> {
        self.simulate_network(&self.manifest_fetches).await?;
        self.manifests
            .read()
            .get(product.id())
            .cloned()
            .ok_or_else(|| RemoteError::not_found(product.to_string()))
    }

    async fn fetch_range(
        &self,
        path: &ProductPath,
        offset: u64,
        length: u64,
    ) -> RemoteResult<Vec<u8>> {
        self.simulate_network(&self.range_fetches).await?;
        let files = self.files.read();
        let data = files
            .get(path)
            .ok_or_else(|| RemoteError::not_found(path.to_string()))?;

        let invalid = || RemoteError::InvalidRange {
            path: path.to_string(),
            offset,
            length,
        };
        let start = usize::try_from(offset).map_err(|_| invalid())?;
        if start > data.len() {
            return Err(invalid());
        }
        let end = usize::try_from(length)
            .ok()
            .and_then(|l| start.checked_add(l))
            .map_or(data.len(), |e| e.min(data.len()));
        Ok(data[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_pages() {
        let remote = MemoryRemote::new();
        for i in 0..5 {
            remote.add_listing_record("Sentinel-1", format!("record-{i}"));
        }

        let page = remote.fetch_listing("Sentinel-1", 0, 2).await.unwrap();
        assert_eq!(page, b"record-0\nrecord-1");
        let page = remote.fetch_listing("Sentinel-1", 4, 2).await.unwrap();
        assert_eq!(page, b"record-4");
        let page = remote.fetch_listing("Sentinel-2", 0, 2).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(remote.listing_fetches(), 3);
    }

    #[tokio::test]
    async fn test_manifest_lookup() {
        let remote = MemoryRemote::new();
        remote.set_manifest("uuid", b"100\ta".to_vec());

        let product = ProductPath::new("uuid", "p.SAFE");
        assert_eq!(remote.fetch_manifest(&product).await.unwrap(), b"100\ta");

        let missing = ProductPath::new("nope", "p.SAFE");
        assert!(matches!(
            remote.fetch_manifest(&missing).await,
            Err(RemoteError::NotFound(_))
        ));
        assert_eq!(remote.manifest_fetches(), 2);
    }

    #[tokio::test]
    async fn test_range_reads() {
        let remote = MemoryRemote::new();
        let path = ProductPath::with_path("uuid", "p.SAFE", "a/b");
        remote.set_file(path.clone(), b"hello world".to_vec());

        assert_eq!(remote.fetch_range(&path, 6, 5).await.unwrap(), b"world");
        assert_eq!(remote.fetch_range(&path, 6, 100).await.unwrap(), b"world");
        assert!(matches!(
            remote.fetch_range(&path, 12, 1).await,
            Err(RemoteError::InvalidRange { offset: 12, .. })
        ));
    }

    #[tokio::test]
    async fn test_offline() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        let err = remote
            .fetch_manifest(&ProductPath::new("uuid", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));

        remote.set_offline(false);
        assert!(remote.fetch_listing("m", 0, 10).await.is_ok());
    }
}
