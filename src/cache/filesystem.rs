//! @acp:module "Filesystem Cache"
//! @acp:summary "Cache store persisting one JSON file per key"
//! @acp:domain metadata
//! @acp:layer service

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use super::CacheStore;
use crate::error::{MetaError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    value: Value,
}

/// @acp:summary "Cache backed by a directory of JSON files"
#[derive(Debug, Clone)]
pub struct FilesystemCache {
    dir: PathBuf,
}

impl FilesystemCache {
    /// The directory is created on first store
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            return Err(MetaError::Cache(format!("invalid cache key `{}`", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn read(&self, key: &str) -> Result<Option<StoredEntry>> {
        let path = self.entry_path(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: StoredEntry = serde_json::from_str(&content)?;
        if entry.expires_at.is_some_and(|at| at <= Utc::now()) {
            debug!(path = %path.display(), "cache entry expired");
            return Ok(None);
        }
        Ok(Some(entry))
    }
}

impl CacheStore for FilesystemCache {
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }

    fn fetch(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read(key)?.map(|entry| entry.value))
    }

    fn store(&self, key: &str, value: Value, ttl: u64) -> Result<()> {
        let path = self.entry_path(key)?;
        let seconds = i64::try_from(ttl).unwrap_or(i64::MAX);
        let expires_at = (ttl > 0)
            .then(|| Duration::try_seconds(seconds))
            .flatten()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        let content = serde_json::to_string(&StoredEntry { expires_at, value })?;

        fs::create_dir_all(&self.dir)?;
        // Write then rename so readers never see a partial file
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_fetch() {
        let dir = TempDir::new().unwrap();
        let cache = FilesystemCache::new(dir.path().join("cache"));
        assert!(!cache.contains("abc").unwrap());

        cache.store("abc", json!(["a", "b"]), 300).unwrap();
        assert!(cache.contains("abc").unwrap());
        assert_eq!(cache.fetch("abc").unwrap(), Some(json!(["a", "b"])));
        assert!(dir.path().join("cache/abc.json").exists());
    }

    #[test]
    fn test_entries_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        FilesystemCache::new(dir.path()).store("k", json!(1), 0).unwrap();
        assert_eq!(FilesystemCache::new(dir.path()).fetch("k").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let dir = TempDir::new().unwrap();
        let cache = FilesystemCache::new(dir.path());
        let expired = StoredEntry {
            expires_at: Some(Utc::now() - Duration::seconds(5)),
            value: json!("stale"),
        };
        fs::write(
            dir.path().join("old.json"),
            serde_json::to_string(&expired).unwrap(),
        )
        .unwrap();

        assert!(!cache.contains("old").unwrap());
        assert_eq!(cache.fetch("old").unwrap(), None);
    }

    #[test]
    fn test_concurrent_stores_of_one_key() {
        let dir = TempDir::new().unwrap();
        let cache = FilesystemCache::new(dir.path());

        std::thread::scope(|scope| {
            for i in 0..8 {
                let cache = &cache;
                scope.spawn(move || cache.store("shared", json!(i), 0).unwrap());
            }
        });

        assert!(cache.fetch("shared").unwrap().is_some());
        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("shared.json")]);
    }

    #[test]
    fn test_huge_ttl_is_stored_without_expiry() {
        let dir = TempDir::new().unwrap();
        let cache = FilesystemCache::new(dir.path());
        cache.store("k", json!(1), u64::MAX).unwrap();
        assert_eq!(cache.fetch("k").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let cache = FilesystemCache::new(dir.path());
        assert!(matches!(
            cache.store("../escape", json!(1), 0),
            Err(MetaError::Cache(_))
        ));
    }
}
