//! Cache integration tests
//!
//! Cached lookups must return the same results without re-reading sources,
//! and source modification must invalidate entries.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;

use classmeta::{
    CacheStore, ClassIndex, ClassMetaManager, FilesystemCache, Groups, MemoryCache, VoidCache,
};
use common::*;

// =============================================================================
// Memory cache
// =============================================================================

mod memory_cache_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_meta_cached() {
        let spy = SpyReflector::new(fixture_index());
        let manager = ClassMetaManager::new(&spy).with_cache(MemoryCache::new(), 300);

        let first = manager.class_meta(INVOICE, &Groups::default()).unwrap();
        assert_eq!(spy.doc_reads(), 1);

        let second = manager.class_meta(INVOICE, &Groups::default()).unwrap();
        assert_eq!(spy.doc_reads(), 1);
        assert_eq!(first, second);
        assert_eq!(second.unwrap().data_str("name"), Some("Invoice"));
    }

    #[test]
    fn test_missing_class_meta_is_not_cached() {
        let spy = SpyReflector::new(fixture_index());
        let manager = ClassMetaManager::new(&spy).with_cache(MemoryCache::new(), 300);

        assert!(manager.class_meta(PLAIN_CLASS, &Groups::default()).unwrap().is_none());
        assert!(manager.class_meta(PLAIN_CLASS, &Groups::default()).unwrap().is_none());
        assert_eq!(spy.doc_reads(), 2);

        // Rejected by the group filter: not cached either
        assert!(manager.class_meta(INVOICE, &Groups::from(["customer"])).unwrap().is_none());
        assert!(manager.class_meta(INVOICE, &Groups::from(["customer"])).unwrap().is_none());
        assert_eq!(spy.doc_reads(), 4);
    }

    #[test]
    fn test_constants_meta_cached() {
        let spy = SpyReflector::new(fixture_index());
        let manager = ClassMetaManager::new(&spy).with_cache(MemoryCache::new(), 300);

        let first = manager
            .class_constants_meta(INVOICE_EXTENDED, &Groups::default())
            .unwrap();
        // One read for the class, one for its parent
        assert_eq!(spy.source_reads(), 2);

        let second = manager
            .class_constants_meta(INVOICE_EXTENDED, &Groups::default())
            .unwrap();
        assert_eq!(spy.source_reads(), 2);
        assert_eq!(first, second);
        assert_eq!(
            second.keys().collect::<Vec<_>>(),
            vec!["DRAFT", "SENT", "BASE"]
        );
    }

    #[test]
    fn test_empty_constants_meta_is_cached() {
        let spy = SpyReflector::new(fixture_index());
        let manager = ClassMetaManager::new(&spy).with_cache(MemoryCache::new(), 300);

        assert!(manager
            .class_constants_meta(PLAIN_CLASS, &Groups::default())
            .unwrap()
            .is_empty());
        assert!(manager
            .class_constants_meta(PLAIN_CLASS, &Groups::default())
            .unwrap()
            .is_empty());
        assert_eq!(spy.source_reads(), 1);
    }

    #[test]
    fn test_groups_are_part_of_the_key() {
        let spy = SpyReflector::new(fixture_index());
        let manager = ClassMetaManager::new(&spy).with_cache(MemoryCache::new(), 300);

        let default = manager.class_constants_meta(INVOICE, &Groups::default()).unwrap();
        let customer = manager
            .class_constants_meta(INVOICE, &Groups::from(["customer"]))
            .unwrap();
        assert_eq!(spy.source_reads(), 2);
        assert_eq!(default.keys().collect::<Vec<_>>(), vec!["DRAFT", "SENT"]);
        assert_eq!(customer.keys().collect::<Vec<_>>(), vec!["PAID"]);
    }

    #[test]
    fn test_custom_kind_cached() {
        let spy = SpyReflector::new(fixture_index());
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());

        let custom: ClassMetaManager<_, MyMeta> =
            ClassMetaManager::for_kind(&spy).with_shared_cache(Arc::clone(&cache), 300);
        let first = custom
            .class_constants_meta(CUSTOM_EXTENDED, &Groups::default())
            .unwrap();
        let second = custom
            .class_constants_meta(CUSTOM_EXTENDED, &Groups::default())
            .unwrap();
        assert_eq!(spy.source_reads(), 2);
        assert_eq!(first, second);
        assert_eq!(second["BAZ"].kind.foo, "Baz thingy");

        // The base kind over the same store keeps its own entries
        let plain = ClassMetaManager::new(&spy).with_shared_cache(cache, 300);
        let metas = plain
            .class_constants_meta(CUSTOM_EXTENDED, &Groups::default())
            .unwrap();
        assert_eq!(spy.source_reads(), 4);
        assert_eq!(metas.keys().collect::<Vec<_>>(), vec!["FOO", "BAR", "BAZ"]);
        assert_eq!(metas["BAZ"].value, json!("baz"));
    }

    #[test]
    fn test_void_cache_always_recomputes() {
        let spy = SpyReflector::new(fixture_index());
        let manager = ClassMetaManager::new(&spy).with_cache(VoidCache, 300);

        manager.class_constants_meta(INVOICE, &Groups::default()).unwrap();
        manager.class_constants_meta(INVOICE, &Groups::default()).unwrap();
        assert_eq!(spy.source_reads(), 2);
    }
}

// =============================================================================
// Invalidation
// =============================================================================

mod invalidation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const V1: &str = r#"<?php
namespace App;

use ClassMeta\Annotation\Meta;

class Status
{
    /** @Meta(data={"name"="Old"}) */
    const ACTIVE = 'active';
}
"#;

    const V2: &str = r#"<?php
namespace App;

use ClassMeta\Annotation\Meta;

class Status
{
    /** @Meta(data={"name"="New"}) */
    const ACTIVE = 'active';
}
"#;

    #[test]
    fn test_modified_source_gets_a_new_entry() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let modified = Utc::now();

        let mut before = ClassIndex::new();
        before.add_source("Status.php", V1, modified);
        let manager = ClassMetaManager::new(before).with_shared_cache(Arc::clone(&cache), 0);
        let metas = manager.class_constants_meta("App\\Status", &Groups::default()).unwrap();
        assert_eq!(metas["ACTIVE"].data_str("name"), Some("Old"));

        // Same modification time: the stale entry is still served
        let mut unchanged = ClassIndex::new();
        unchanged.add_source("Status.php", V2, modified);
        let manager = ClassMetaManager::new(unchanged).with_shared_cache(Arc::clone(&cache), 0);
        let metas = manager.class_constants_meta("App\\Status", &Groups::default()).unwrap();
        assert_eq!(metas["ACTIVE"].data_str("name"), Some("Old"));

        let mut after = ClassIndex::new();
        after.add_source("Status.php", V2, modified + Duration::seconds(1));
        let manager = ClassMetaManager::new(after).with_shared_cache(cache, 0);
        let metas = manager.class_constants_meta("App\\Status", &Groups::default()).unwrap();
        assert_eq!(metas["ACTIVE"].data_str("name"), Some("New"));
    }
}

// =============================================================================
// Filesystem cache
// =============================================================================

mod filesystem_cache_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entries_shared_across_managers() {
        let dir = TempDir::new().unwrap();

        let spy = SpyReflector::new(fixture_index());
        let manager =
            ClassMetaManager::new(&spy).with_cache(FilesystemCache::new(dir.path()), 300);
        let first = manager
            .class_constants_meta(INVOICE_EXTENDED, &Groups::default())
            .unwrap();
        let class_meta = manager.class_meta(INVOICE, &Groups::default()).unwrap();
        assert_eq!(spy.source_reads(), 2);

        // A fresh manager and reflector over the same directory
        let spy = SpyReflector::new(fixture_index());
        let manager =
            ClassMetaManager::new(&spy).with_cache(FilesystemCache::new(dir.path()), 300);
        let second = manager
            .class_constants_meta(INVOICE_EXTENDED, &Groups::default())
            .unwrap();
        assert_eq!(manager.class_meta(INVOICE, &Groups::default()).unwrap(), class_meta);
        assert_eq!(spy.source_reads(), 0);
        assert_eq!(spy.doc_reads(), 0);
        assert_eq!(first, second);

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 3);
    }

    #[test]
    fn test_custom_kind_round_trips_through_files() {
        let dir = TempDir::new().unwrap();
        let index = fixture_index();

        let manager: ClassMetaManager<_, MyMeta> =
            ClassMetaManager::for_kind(&index).with_cache(FilesystemCache::new(dir.path()), 0);
        let fresh = manager.class_meta(CUSTOM, &Groups::default()).unwrap();
        let cached = manager.class_meta(CUSTOM, &Groups::default()).unwrap();

        assert_eq!(fresh, cached);
        assert_eq!(cached.unwrap().kind.foo, "Class meta here");
    }
}
