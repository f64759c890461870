//! @acp:module "Memory Cache"
//! @acp:summary "In-process cache store with per-entry expiry"
//! @acp:domain metadata
//! @acp:layer service

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;

use super::CacheStore;
use crate::error::{MetaError, Result};

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

/// @acp:summary "Thread-safe in-memory cache"
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| MetaError::Cache("memory cache lock poisoned".to_string()))
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.lock()
            .map(|entries| entries.values().filter(|e| e.is_live()).count())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.get(key).is_some_and(Entry::is_live))
    }

    fn fetch(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, value: Value, ttl: u64) -> Result<()> {
        // A lifetime past the clock's range never expires
        let expires_at = (ttl > 0)
            .then(|| Instant::now().checked_add(Duration::from_secs(ttl)))
            .flatten();
        let mut entries = self.lock()?;
        // Superseded fingerprints are never fetched again
        entries.retain(|_, entry| entry.is_live());
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
