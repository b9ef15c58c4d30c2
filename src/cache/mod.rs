//! Cache backends.
//!
//! Two backends implement the [`ObjectCache`] contract:
//!
//! - [`ProcessCache`]: in-process object and collection cache. Object
//!   entries and cached collections live in two [`LruStore`](crate::lru::LruStore)s;
//!   a [`DependencyIndex`] records which collections depend on which classes
//!   so that a change to any object of a class drops every query result
//!   that might have included it.
//!
//! - [`NoopCache`]: caching disabled. Every lookup misses, every store is
//!   discarded.
//!
//! # Locking
//!
//! Backends guard their cross-structure invariants with one coarse
//! shared/exclusive lock. Reads take it shared; a read that finds an
//! expired entry still reclaims it, together with whatever that entry
//! cascades to, under the shared lock. Every mutation runs under
//! [`ObjectCache::lock()`], which hands out a [`CacheLock`]: the exclusive
//! lock plus the operations that may run while it is held. The transaction
//! layer uses it to make a batch of invalidations atomic:
//!
//! ```rust
//! # use muninn::cache::{ObjectCache, ProcessCache};
//! # use muninn::types::InvalidateReason;
//! let cache = ProcessCache::default();
//! let mut lock = cache.lock();
//! lock.invalidate("Contact", &1.into(), InvalidateReason::Updated);
//! lock.invalidate("Contact", &2.into(), InvalidateReason::Deleted);
//! cache.unlock(lock);
//! ```
//!
//! The lock is not reentrant. While a thread holds a [`CacheLock`] it must
//! route every cache call through it; calling the backend directly from
//! the same thread deadlocks.

mod dependency;
mod noop;
mod process;

pub use dependency::DependencyIndex;
pub use noop::NoopCache;
pub use process::{ProcessCache, ProcessCacheConfig};

use serde::Serialize;

use crate::types::{CacheEntry, InvalidateReason, PrimaryKey};
use crate::{MuninnError, Result};

/// Exclusive access to a cache backend for a caller-defined critical section.
///
/// Dropping the lock (or passing it to [`ObjectCache::unlock()`]) releases it.
pub type CacheLock<'a> = Box<dyn LockedCache + 'a>;

/// Operations available while a backend's exclusive lock is held.
pub trait LockedCache {
    fn find(&self, class_name: &str, primary_key: &PrimaryKey) -> Option<CacheEntry>;

    fn load_collection(&self, collection_key: &str) -> Option<Vec<PrimaryKey>>;

    /// Store an entry, replacing any entry already cached for the key.
    fn add(&mut self, class_name: &str, primary_key: PrimaryKey, entry: CacheEntry);

    /// Drop the object and every collection that depends on its class.
    fn invalidate(&mut self, class_name: &str, primary_key: &PrimaryKey, reason: InvalidateReason);

    /// Drop the object and the collections that listed it and asked to be
    /// evicted with it.
    fn evict(&mut self, class_name: &str, primary_key: &PrimaryKey);

    /// Cache an ordered query result.
    ///
    /// The collection is registered as depending on `root_class_name` and
    /// on every class in `dependent_class_names`. With
    /// `evict_when_item_removed`, every listed object that is currently
    /// cached records a back-reference so that evicting it also evicts the
    /// collection.
    fn store_collection(
        &mut self,
        collection_key: &str,
        root_class_name: &str,
        primary_keys: Vec<PrimaryKey>,
        dependent_class_names: &[&str],
        evict_when_item_removed: bool,
    );

    fn evict_collection(&mut self, collection_key: &str);

    fn clear(&mut self);

    /// Reclaim expired items. Returns how many were removed.
    fn sweep(&mut self) -> usize;
}

/// Outcome of a lookup that expects at most one cached primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleResult {
    /// No cached collection under that key.
    NotCached,
    /// The cached result is empty.
    Empty,
    Found(PrimaryKey),
}

/// Point-in-time sizes, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    pub objects: usize,
    pub collections: usize,
    pub dependency_classes: usize,
}

/// The cache contract consumed by the object-mapper layer.
///
/// Mutating methods are provided: each takes the exclusive lock for exactly
/// one operation.
pub trait ObjectCache: Send + Sync {
    /// Look up an object entry. An expired entry is reclaimed on the spot,
    /// which evicts the collections that asked to be evicted with it.
    fn find(&self, class_name: &str, primary_key: &PrimaryKey) -> Option<CacheEntry>;

    /// Primary keys of a cached query result, in result order.
    fn load_collection(&self, collection_key: &str) -> Option<Vec<PrimaryKey>>;

    /// Acquire the exclusive lock.
    fn lock(&self) -> CacheLock<'_>;

    fn statistics(&self) -> CacheStatistics;

    /// Release a lock obtained from [`lock()`](Self::lock).
    fn unlock(&self, lock: CacheLock<'_>) {
        drop(lock);
    }

    fn add(&self, class_name: &str, primary_key: PrimaryKey, entry: CacheEntry) {
        self.lock().add(class_name, primary_key, entry);
    }

    fn invalidate(&self, class_name: &str, primary_key: &PrimaryKey, reason: InvalidateReason) {
        self.lock().invalidate(class_name, primary_key, reason);
    }

    fn evict(&self, class_name: &str, primary_key: &PrimaryKey) {
        self.lock().evict(class_name, primary_key);
    }

    fn store_collection(
        &self,
        collection_key: &str,
        root_class_name: &str,
        primary_keys: Vec<PrimaryKey>,
        dependent_class_names: &[&str],
        evict_when_item_removed: bool,
    ) {
        self.lock().store_collection(
            collection_key,
            root_class_name,
            primary_keys,
            dependent_class_names,
            evict_when_item_removed,
        );
    }

    fn evict_collection(&self, collection_key: &str) {
        self.lock().evict_collection(collection_key);
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn sweep(&self) -> usize {
        self.lock().sweep()
    }

    /// Load a cached result that should hold at most one object, e.g. a
    /// lookup by a unique column.
    ///
    /// Fails with [`MuninnError::NotSingleton`] when the cached result holds
    /// more than one key.
    fn load_single_collection(&self, collection_key: &str) -> Result<SingleResult> {
        let Some(mut keys) = self.load_collection(collection_key) else {
            return Ok(SingleResult::NotCached);
        };
        if keys.len() > 1 {
            return Err(MuninnError::NotSingleton {
                key: collection_key.to_owned(),
                count: keys.len(),
            });
        }
        Ok(keys.pop().map_or(SingleResult::Empty, SingleResult::Found))
    }
}
