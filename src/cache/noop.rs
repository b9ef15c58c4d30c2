//! Cache backend for "caching disabled".

use super::{CacheLock, CacheStatistics, LockedCache, ObjectCache};
use crate::types::{CacheEntry, InvalidateReason, PrimaryKey};

/// A backend that caches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl NoopCache {
    pub fn new() -> Self {
        Self
    }
}

struct NoopLock;

impl LockedCache for NoopLock {
    fn find(&self, _class_name: &str, _primary_key: &PrimaryKey) -> Option<CacheEntry> {
        None
    }

    fn load_collection(&self, _collection_key: &str) -> Option<Vec<PrimaryKey>> {
        None
    }

    fn add(&mut self, _class_name: &str, _primary_key: PrimaryKey, _entry: CacheEntry) {}

    fn invalidate(
        &mut self,
        _class_name: &str,
        _primary_key: &PrimaryKey,
        _reason: InvalidateReason,
    ) {
    }

    fn evict(&mut self, _class_name: &str, _primary_key: &PrimaryKey) {}

    fn store_collection(
        &mut self,
        _collection_key: &str,
        _root_class_name: &str,
        _primary_keys: Vec<PrimaryKey>,
        _dependent_class_names: &[&str],
        _evict_when_item_removed: bool,
    ) {
    }

    fn evict_collection(&mut self, _collection_key: &str) {}

    fn clear(&mut self) {}

    fn sweep(&mut self) -> usize {
        0
    }
}

impl ObjectCache for NoopCache {
    fn find(&self, _class_name: &str, _primary_key: &PrimaryKey) -> Option<CacheEntry> {
        None
    }

    fn load_collection(&self, _collection_key: &str) -> Option<Vec<PrimaryKey>> {
        None
    }

    fn lock(&self) -> CacheLock<'_> {
        Box::new(NoopLock)
    }

    fn statistics(&self) -> CacheStatistics {
        CacheStatistics::default()
    }
}
