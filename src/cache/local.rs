// Read-through table cache.
// Serves a table from its cache file when present, otherwise runs the producer and persists the result.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{AcquireError, Result};
use crate::table::Table;

use super::paths::entry_file_name;
use super::store::{self, EntryStatus};

/// Where an acquired table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Read from an existing cache file.
    Cache,
    /// Produced fresh and written to the cache.
    Network,
}

/// A table together with its provenance.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub table: Table,
    pub source: Source,
    /// The cache file backing this table.
    pub path: PathBuf,
}

/// Directory of write-once cache files keyed by name.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(entry_file_name(key))
    }

    /// Return the cached table for `key`, or produce, persist, and return it.
    ///
    /// The producer runs only on a miss. A cache file that exists but does not
    /// parse is reported as `CacheRead` and the producer is not consulted.
    /// If the write after a successful produce fails the error is
    /// `CachePersist`, which still carries the produced table.
    pub async fn get<F, Fut>(&self, key: &str, produce: F) -> Result<Acquired>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Table>>,
    {
        let path = self.path(key);

        if let Some(table) = store::read_table(&path)? {
            debug!(key, path = %path.display(), rows = table.len(), "Cache hit");
            return Ok(Acquired {
                table,
                source: Source::Cache,
                path,
            });
        }

        debug!(key, path = %path.display(), "Cache miss");
        let table = produce().await?;

        if let Err(source) = store::write_table(&path, &table) {
            warn!(key, path = %path.display(), error = %source, "Failed to persist cache file");
            return Err(AcquireError::CachePersist {
                path,
                source,
                table: Box::new(table),
            });
        }

        info!(key, path = %path.display(), rows = table.len(), "Cached");
        Ok(Acquired {
            table,
            source: Source::Network,
            path,
        })
    }

    /// Size and age of the cache file for `key`, if one exists.
    pub fn status(&self, key: &str) -> Result<Option<EntryStatus>> {
        store::entry_status(&self.path(key))
    }

    /// Delete the cache file for `key`. Returns whether a file was removed.
    pub fn evict(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        let removed = store::delete(&path)?;
        if removed {
            info!(key, path = %path.display(), "Evicted cache file");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::api::PagedFetcher;
    use crate::api::fetcher::tests::{ScriptedTransport, items_endpoint, two_page_transport};

    #[tokio::test]
    async fn test_miss_then_hit() {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path());
        let transport = two_page_transport();
        let fetcher = PagedFetcher::new(&transport, items_endpoint());

        let first = cache.get("items", || fetcher.fetch()).await.unwrap();
        assert_eq!(first.source, Source::Network);
        assert_eq!(first.table.len(), 6);
        assert_eq!(transport.requests().len(), 2);

        // Exactly one header plus the six rows landed on disk.
        let contents = fs::read_to_string(temp_dir.path().join("items.csv")).unwrap();
        assert_eq!(contents.lines().count(), 7);
        assert_eq!(contents.lines().next(), Some("item_id,item_name"));

        // No network this time: a transport that knows no URLs would fail every request.
        let offline = ScriptedTransport::default();
        let offline_fetcher = PagedFetcher::new(&offline, items_endpoint());
        let second = cache.get("items", || offline_fetcher.fetch()).await.unwrap();

        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.path, first.path);
        assert_eq!(second.table.columns(), first.table.columns());
        assert_eq!(second.table.to_text_rows(), first.table.to_text_rows());
        assert!(offline.requests().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_cache_does_not_refetch() {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path());
        fs::write(cache.path("sales"), "sale_id,item\n1,2,3\n").unwrap();

        let called = Cell::new(false);
        let err = cache
            .get("sales", || async {
                called.set(true);
                Ok(Table::new())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::CacheRead { .. }));
        assert!(!called.get());
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path());
        let transport = ScriptedTransport::default();
        let fetcher = PagedFetcher::new(&transport, items_endpoint());

        let err = cache.get("items", || fetcher.fetch()).await.unwrap_err();

        assert!(matches!(err, AcquireError::Fetch { .. }));
        assert!(!cache.path("items").exists());
        assert!(cache.status("items").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_still_returns_table() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the cache directory should be makes every write fail.
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let cache = LocalCache::new(&blocker);
        let transport = two_page_transport();
        let fetcher = PagedFetcher::new(&transport, items_endpoint());

        let err = cache.get("items", || fetcher.fetch()).await.unwrap_err();

        assert!(matches!(err, AcquireError::CachePersist { .. }));
        let table = err.into_table().unwrap();
        assert_eq!(table.len(), 6);
    }

    #[tokio::test]
    async fn test_evict_forces_refetch() {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path());
        let transport = two_page_transport();
        let fetcher = PagedFetcher::new(&transport, items_endpoint());

        cache.get("items", || fetcher.fetch()).await.unwrap();
        assert!(cache.status("items").unwrap().is_some());

        assert!(cache.evict("items").unwrap());
        assert!(!cache.evict("items").unwrap());

        let again = cache.get("items", || fetcher.fetch()).await.unwrap();
        assert_eq!(again.source, Source::Network);
        assert_eq!(transport.requests().len(), 4);
    }

    #[test]
    fn test_path_uses_sanitized_key() {
        let cache = LocalCache::new("/tmp/acquire-test");
        assert_eq!(
            cache.path("items_df"),
            PathBuf::from("/tmp/acquire-test/items_df.csv")
        );
        assert_eq!(
            cache.path("a/b"),
            PathBuf::from("/tmp/acquire-test/a_b.csv")
        );
    }
}
