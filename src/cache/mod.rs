//! @acp:module "Cache"
//! @acp:summary "Cache store seam, fingerprint keys and bundled backends"
//! @acp:domain metadata
//! @acp:layer service
//!
//! Keys are fingerprints of (prefix, class, source modification marker,
//! requested groups), so editing a class file makes its old entries
//! unreachable. Nothing here evicts entries for the resolver.

mod filesystem;
mod memory;

pub use filesystem::FilesystemCache;
pub use memory::MemoryCache;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::meta::Groups;

/// Entry lifetime in seconds used unless configured otherwise
pub const DEFAULT_TTL: u64 = 300;

/// @acp:summary "Opaque key/value store for resolved metadata"
pub trait CacheStore: Send + Sync {
    fn contains(&self, key: &str) -> Result<bool>;

    /// The stored value, or `None` when absent or expired
    fn fetch(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value`; a `ttl` of 0 keeps it until the store is dropped
    fn store(&self, key: &str, value: Value, ttl: u64) -> Result<()>;
}

/// @acp:summary "Store that never holds anything"
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidCache;

impl CacheStore for VoidCache {
    fn contains(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    fn fetch(&self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn store(&self, _key: &str, _value: Value, _ttl: u64) -> Result<()> {
        Ok(())
    }
}

/// @acp:summary "Compute the cache key for a lookup"
/// SHA-256 hex of `prefix + class + marker + serialized groups`.
pub fn fingerprint(
    prefix: &str,
    class: &str,
    marker: &DateTime<Utc>,
    groups: &Groups,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(class.as_bytes());
    hasher.update(marker.timestamp_micros().to_string().as_bytes());
    hasher.update(serde_json::to_string(groups)?.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_void_cache_is_always_empty() {
        let cache = VoidCache;
        cache.store("k", json!(1), 0).unwrap();
        assert!(!cache.contains("k").unwrap());
        assert_eq!(cache.fetch("k").unwrap(), None);
    }

    #[test]
    fn test_fingerprint_varies_with_each_component() {
        let t1 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t2 = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
        let base = fingerprint("class_", "A", &t1, &Groups::default()).unwrap();

        assert_eq!(base.len(), 64);
        assert_eq!(base, fingerprint("class_", "A", &t1, &Groups::default()).unwrap());
        assert_ne!(base, fingerprint("constants_", "A", &t1, &Groups::default()).unwrap());
        assert_ne!(base, fingerprint("class_", "B", &t1, &Groups::default()).unwrap());
        assert_ne!(base, fingerprint("class_", "A", &t2, &Groups::default()).unwrap());
        assert_ne!(base, fingerprint("class_", "A", &t1, &Groups::all()).unwrap());
    }
}
