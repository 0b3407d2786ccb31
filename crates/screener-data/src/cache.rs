//! Date-stamped on-disk cache.
//!
//! Payloads are stored as JSON under `<root>/<kind>/<key>_<stamp>.json`.
//! The stamp is the start of the current refresh bucket (see
//! [`RefreshInterval::stamp`]), so a file is reused until the bucket rolls
//! over and the next fetch writes a new one.

use chrono::{Local, NaiveDate};
use screener_core::error::DataError;
use screener_core::types::RefreshInterval;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Simple JSON file cache keyed by data kind, key and refresh bucket.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
    today: Option<NaiveDate>,
}

impl FileCache {
    /// Create a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            today: None,
        }
    }

    /// Pin the date used for refresh buckets.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Get cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Make a key safe for use in a file name.
    pub fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect()
    }

    /// Path of the cache file for the current bucket.
    pub fn path_for(&self, kind: &str, key: &str, interval: RefreshInterval) -> PathBuf {
        let stamp = interval.stamp(self.today());
        self.root
            .join(kind)
            .join(format!("{}_{}.json", Self::sanitize_key(key), stamp))
    }

    /// Load a cached payload for the current bucket.
    ///
    /// A missing file is `Ok(None)`; an unreadable one is an error.
    pub async fn load<T: DeserializeOwned>(
        &self,
        kind: &str,
        key: &str,
        interval: RefreshInterval,
    ) -> Result<Option<T>, DataError> {
        let path = self.path_for(kind, key, interval);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DataError::CacheError(e.to_string())),
        };
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| DataError::CacheError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Cache hit");
        Ok(Some(value))
    }

    /// Store a payload for the current bucket, removing older buckets of the same key.
    pub async fn store<T: Serialize>(
        &self,
        kind: &str,
        key: &str,
        interval: RefreshInterval,
        value: &T,
    ) -> Result<PathBuf, DataError> {
        let path = self.path_for(kind, key, interval);
        let dir = self.root.join(kind);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?;

        self.remove_stale(&dir, &Self::sanitize_key(key), &path).await;

        let bytes = serde_json::to_vec(value).map_err(|e| DataError::CacheError(e.to_string()))?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?;
        Ok(path)
    }

    /// Return the cached payload, or run `fetch` and cache its result.
    ///
    /// A corrupt cache file is logged and refetched.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        kind: &str,
        key: &str,
        interval: RefreshInterval,
        fetch: F,
    ) -> Result<T, DataError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        match self.load::<T>(kind, key, interval).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => warn!(kind, key, error = %e, "Discarding unreadable cache entry"),
        }

        let value = fetch().await?;
        if let Err(e) = self.store(kind, key, interval, &value).await {
            warn!(kind, key, error = %e, "Failed to write cache entry");
        }
        Ok(value)
    }

    /// Write rows as a CSV snapshot under `<root>/<kind>/<key>_<date>.csv`.
    ///
    /// Snapshots are debug artefacts and are never read back.
    pub fn store_csv<T: Serialize>(&self, kind: &str, key: &str, rows: &[T]) -> Result<PathBuf, DataError> {
        let dir = self.root.join(kind);
        std::fs::create_dir_all(&dir).map_err(|e| DataError::CacheError(e.to_string()))?;
        let path = dir.join(format!(
            "{}_{}.csv",
            Self::sanitize_key(key),
            self.today().format("%Y-%m-%d")
        ));

        let mut writer = csv::Writer::from_path(&path).map_err(|e| DataError::CacheError(e.to_string()))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| DataError::CacheError(e.to_string()))?;
        }
        writer.flush().map_err(|e| DataError::CacheError(e.to_string()))?;
        Ok(path)
    }

    /// Delete every cached file of one kind.
    pub fn clear_kind(&self, kind: &str) -> Result<(), DataError> {
        let dir = self.root.join(kind);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| DataError::CacheError(e.to_string()))?;
        }
        Ok(())
    }

    async fn remove_stale(&self, dir: &Path, key: &str, current: &Path) {
        let Ok(mut entries) = fs::read_dir(dir).await else {
            return;
        };
        let prefix = format!("{}_", key);
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path == current {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };
            // Only our own stamps, so keys sharing a prefix are left alone.
            if stamp == "static" || NaiveDate::parse_from_str(stamp, "%Y-%m-%d").is_ok() {
                if let Err(e) = fs::remove_file(&path).await {
                    debug!(path = %path.display(), error = %e, "Failed to remove stale cache file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let cache = FileCache::new("/tmp/cache").with_today(day(2024, 3, 14));
        let path = cache.path_for("grades", "BRK.B", RefreshInterval::Weekly);
        assert_eq!(path, PathBuf::from("/tmp/cache/grades/BRK.B_2024-03-11.json"));

        let path = cache.path_for("list", "nyse/nasdaq", RefreshInterval::Never);
        assert_eq!(path, PathBuf::from("/tmp/cache/list/nyse_nasdaq_static.json"));
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).with_today(day(2024, 3, 14));

        cache
            .store("prices", "AAPL", RefreshInterval::Daily, &vec![1.0, 2.0])
            .await
            .unwrap();
        let loaded: Option<Vec<f64>> = cache.load("prices", "AAPL", RefreshInterval::Daily).await.unwrap();
        assert_eq!(loaded, Some(vec![1.0, 2.0]));

        let missing: Option<Vec<f64>> = cache.load("prices", "MSFT", RefreshInterval::Daily).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_new_bucket_replaces_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let monday = FileCache::new(dir.path()).with_today(day(2024, 3, 11));
        let tuesday = FileCache::new(dir.path()).with_today(day(2024, 3, 12));

        monday.store("prices", "AAPL", RefreshInterval::Daily, &1).await.unwrap();
        monday.store("prices", "AAPLX", RefreshInterval::Daily, &9).await.unwrap();
        assert!(tuesday
            .load::<i32>("prices", "AAPL", RefreshInterval::Daily)
            .await
            .unwrap()
            .is_none());

        tuesday.store("prices", "AAPL", RefreshInterval::Daily, &2).await.unwrap();
        let files: Vec<_> = std::fs::read_dir(dir.path().join("prices")).unwrap().collect();
        assert_eq!(files.len(), 2);
        assert_eq!(
            monday.load::<i32>("prices", "AAPLX", RefreshInterval::Daily).await.unwrap(),
            Some(9)
        );
    }

    #[test]
    fn test_store_csv_snapshot() {
        #[derive(Serialize)]
        struct Row {
            symbol: &'static str,
            score: f64,
        }

        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).with_today(day(2024, 3, 14));
        let path = cache
            .store_csv("snapshots", "bo_score", &[Row { symbol: "AAPL", score: 0.5 }])
            .unwrap();

        assert!(path.ends_with("snapshots/bo_score_2024-03-14.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "symbol,score\nAAPL,0.5\n");
    }

    #[tokio::test]
    async fn test_get_or_fetch_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).with_today(day(2024, 3, 14));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_fetch("list", "screener", RefreshInterval::Weekly, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["AAPL".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["AAPL".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).with_today(day(2024, 3, 14));
        let path = cache.path_for("grades", "AAPL", RefreshInterval::Daily);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let value: Vec<i32> = cache
            .get_or_fetch("grades", "AAPL", RefreshInterval::Daily, || async { Ok(vec![7]) })
            .await
            .unwrap();
        assert_eq!(value, vec![7]);
    }
}
