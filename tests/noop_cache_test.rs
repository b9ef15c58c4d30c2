//! Tests for [`NoopCache`]: the "caching disabled" backend.

use std::sync::Arc;
use std::thread;

use serde_json::json;

use muninn::cache::{NoopCache, ObjectCache, SingleResult};
use muninn::{CacheEntry, CacheStatistics, InvalidateReason, PrimaryKey};

#[test]
fn every_lookup_misses() {
    let cache = NoopCache::new();
    cache.add("Contact", 1.into(), CacheEntry::new(3, vec![json!(1), json!("x")]));
    cache.store_collection("Contact where true", "Contact", vec![1.into()], &["Group"], true);

    assert!(cache.find("Contact", &1.into()).is_none());
    assert_eq!(cache.load_collection("Contact where true"), None);
    assert_eq!(
        cache.load_single_collection("Contact where true").unwrap(),
        SingleResult::NotCached
    );
}

#[test]
fn mutations_are_inert() {
    let cache = NoopCache::new();
    cache.invalidate("Contact", &1.into(), InvalidateReason::Deleted);
    cache.evict("Contact", &1.into());
    cache.evict_collection("Contact where true");
    cache.clear();
    assert_eq!(cache.sweep(), 0);
    assert_eq!(cache.statistics(), CacheStatistics::default());
}

#[test]
fn lock_is_immediately_releasable() {
    let cache = Arc::new(NoopCache::new());
    let mut lock = cache.lock();
    lock.add("Contact", 1.into(), CacheEntry::new(1, vec![json!(1)]));
    assert!(lock.find("Contact", &1.into()).is_none());

    // another thread is never blocked by a held no-op lock
    let other = Arc::clone(&cache);
    let handle = thread::spawn(move || {
        let _lock = other.lock();
        other.find("Contact", &PrimaryKey::from(1)).is_none()
    });
    assert!(handle.join().expect("thread panicked"));

    cache.unlock(lock);
}
