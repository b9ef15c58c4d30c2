//! In-process object and collection cache.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tracing::{debug, trace};

use super::{CacheLock, CacheStatistics, DependencyIndex, LockedCache, ObjectCache};
use crate::lru::{LruConfig, LruListener, LruStore, RemovalCause};
use crate::telemetry;
use crate::types::{CacheEntry, CacheKey, CachedCollection, InvalidateReason, PrimaryKey};

/// Sizing and expiration for the two stores of a [`ProcessCache`].
///
/// ```rust
/// # use muninn::cache::ProcessCacheConfig;
/// # use std::time::Duration;
/// let config = ProcessCacheConfig::new()
///     .time_to_live(Duration::from_secs(120))
///     .sliding_expiration(false)
///     .max_objects(50_000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessCacheConfig {
    pub objects: LruConfig,
    pub collections: LruConfig,
}

impl ProcessCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live of both stores.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.objects.time_to_live = ttl;
        self.collections.time_to_live = ttl;
        self
    }

    /// Enable or disable sliding expiration in both stores.
    pub fn sliding_expiration(mut self, enabled: bool) -> Self {
        self.objects.sliding_expiration = enabled;
        self.collections.sliding_expiration = enabled;
        self
    }

    /// Set the lazy sweep interval of both stores.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.objects.sweep_interval = interval;
        self.collections.sweep_interval = interval;
        self
    }

    pub fn max_objects(mut self, n: usize) -> Self {
        self.objects.max_items = Some(n);
        self
    }

    pub fn max_collections(mut self, n: usize) -> Self {
        self.collections.max_items = Some(n);
        self
    }
}

/// Drops the collections an object entry points at when the entry leaves
/// the object store, whatever the cause.
struct CascadeToCollections {
    collections: Arc<LruStore<String, CachedCollection>>,
}

impl LruListener<CacheKey, CacheEntry> for CascadeToCollections {
    fn on_removed(&self, key: &CacheKey, entry: &CacheEntry, cause: RemovalCause) {
        for collection_key in entry.dependent_collections() {
            if self.collections.remove(collection_key).is_some() {
                trace!(
                    object = %key,
                    collection = collection_key.as_str(),
                    cause = cause.as_str(),
                    "evicted dependent collection"
                );
            }
        }
    }
}

/// Keeps the dependency index in step with the collection store.
struct UnregisterDependencies {
    dependencies: Arc<Mutex<DependencyIndex>>,
}

impl LruListener<String, CachedCollection> for UnregisterDependencies {
    fn on_removed(&self, key: &String, _collection: &CachedCollection, cause: RemovalCause) {
        if self.dependencies.lock().unregister(key) {
            trace!(collection = key.as_str(), cause = cause.as_str(), "unregistered collection");
        }
    }
}

/// Object and collection cache shared by every thread of the process.
///
/// Lock order is always: the coarse gate, then a store's own monitor. The
/// dependency index mutex is a leaf: it is never held while calling into a
/// store, so removal listeners may take it from any path.
///
/// Reads take the gate shared, yet a read that meets an expired entry
/// reclaims it, and with it any collections that entry cascades to. Those
/// removals are serialized by the store monitors and the index mutex.
pub struct ProcessCache {
    gate: RwLock<()>,
    dependencies: Arc<Mutex<DependencyIndex>>,
    objects: LruStore<CacheKey, CacheEntry>,
    collections: Arc<LruStore<String, CachedCollection>>,
}

impl ProcessCache {
    pub fn new(config: &ProcessCacheConfig) -> Self {
        let dependencies = Arc::new(Mutex::new(DependencyIndex::new()));
        let collections = Arc::new(LruStore::with_listener(
            telemetry::STORE_COLLECTIONS,
            config.collections.clone(),
            Arc::new(UnregisterDependencies {
                dependencies: Arc::clone(&dependencies),
            }),
        ));
        let cascade = Arc::new(CascadeToCollections {
            collections: Arc::clone(&collections),
        });
        let objects =
            LruStore::with_listener(telemetry::STORE_OBJECTS, config.objects.clone(), cascade);
        Self {
            gate: RwLock::new(()),
            dependencies,
            objects,
            collections,
        }
    }

    pub fn object_config(&self) -> &LruConfig {
        self.objects.config()
    }

    pub fn collection_config(&self) -> &LruConfig {
        self.collections.config()
    }
}

impl Default for ProcessCache {
    fn default() -> Self {
        Self::new(&ProcessCacheConfig::default())
    }
}

struct ProcessCacheLock<'a> {
    _gate: RwLockWriteGuard<'a, ()>,
    dependencies: &'a Mutex<DependencyIndex>,
    objects: &'a LruStore<CacheKey, CacheEntry>,
    collections: &'a LruStore<String, CachedCollection>,
}

impl LockedCache for ProcessCacheLock<'_> {
    fn find(&self, class_name: &str, primary_key: &PrimaryKey) -> Option<CacheEntry> {
        self.objects.get(&CacheKey::new(class_name, primary_key.clone()))
    }

    fn load_collection(&self, collection_key: &str) -> Option<Vec<PrimaryKey>> {
        self.collections
            .get(&collection_key.to_owned())
            .map(|c| c.primary_keys().to_vec())
    }

    fn add(&mut self, class_name: &str, primary_key: PrimaryKey, entry: CacheEntry) {
        let key = CacheKey::new(class_name, primary_key);
        trace!(object = %key, mask = entry.data_loaded_mask(), "caching object");
        self.objects.set(key, entry);
    }

    fn invalidate(&mut self, class_name: &str, primary_key: &PrimaryKey, reason: InvalidateReason) {
        let key = CacheKey::new(class_name, primary_key.clone());
        let object_removed = self.objects.remove(&key).is_some();

        let dependents = self.dependencies.lock().take(class_name);
        let collections_removed = dependents
            .iter()
            .filter(|collection_key| self.collections.remove(collection_key).is_some())
            .count();

        debug!(
            object = %key,
            reason = reason.as_str(),
            object_removed,
            collections_removed,
            "invalidated"
        );
        metrics::counter!(telemetry::INVALIDATIONS_TOTAL, "reason" => reason.as_str())
            .increment(1);
    }

    fn evict(&mut self, class_name: &str, primary_key: &PrimaryKey) {
        let key = CacheKey::new(class_name, primary_key.clone());
        if self.objects.remove(&key).is_some() {
            trace!(object = %key, "evicted object");
        }
    }

    fn store_collection(
        &mut self,
        collection_key: &str,
        root_class_name: &str,
        primary_keys: Vec<PrimaryKey>,
        dependent_class_names: &[&str],
        evict_when_item_removed: bool,
    ) {
        let collection = CachedCollection::new(collection_key, root_class_name, primary_keys);
        self.collections
            .set(collection_key.to_owned(), collection.clone());

        // Registered after `set` has dispatched its removals, so reclaiming
        // an expired predecessor cannot unregister the new result.
        if self.collections.contains_key(&collection_key.to_owned()) {
            let mut dependencies = self.dependencies.lock();
            dependencies.register(root_class_name, collection_key);
            for class_name in dependent_class_names {
                dependencies.register(class_name, collection_key);
            }
        }

        if evict_when_item_removed {
            for primary_key in collection.primary_keys() {
                let key = CacheKey::new(root_class_name, primary_key.clone());
                self.objects
                    .update(&key, |entry| entry.add_dependent_collection(collection_key));
            }
        }
        trace!(
            collection = collection_key,
            root = root_class_name,
            keys = collection.len(),
            evict_when_item_removed,
            "caching collection"
        );
    }

    fn evict_collection(&mut self, collection_key: &str) {
        self.collections.remove(&collection_key.to_owned());
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.collections.clear();
        self.dependencies.lock().clear();
        debug!("cleared cache");
    }

    fn sweep(&mut self) -> usize {
        self.objects.sweep() + self.collections.sweep()
    }
}

impl ObjectCache for ProcessCache {
    fn find(&self, class_name: &str, primary_key: &PrimaryKey) -> Option<CacheEntry> {
        let _shared = self.gate.read();
        self.objects
            .get(&CacheKey::new(class_name, primary_key.clone()))
    }

    fn load_collection(&self, collection_key: &str) -> Option<Vec<PrimaryKey>> {
        let _shared = self.gate.read();
        self.collections
            .get(&collection_key.to_owned())
            .map(|c| c.primary_keys().to_vec())
    }

    fn lock(&self) -> CacheLock<'_> {
        Box::new(ProcessCacheLock {
            _gate: self.gate.write(),
            dependencies: &self.dependencies,
            objects: &self.objects,
            collections: &self.collections,
        })
    }

    fn statistics(&self) -> CacheStatistics {
        let _shared = self.gate.read();
        CacheStatistics {
            objects: self.objects.len(),
            collections: self.collections.len(),
            dependency_classes: self.dependencies.lock().class_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(mask: u64) -> CacheEntry {
        CacheEntry::new(mask, vec![json!(1), json!("x")])
    }

    #[test]
    fn back_references_only_for_cached_members() {
        let cache = ProcessCache::default();
        cache.add("Contact", 1.into(), entry(3));
        cache.store_collection("c", "Contact", vec![1.into(), 2.into()], &[], true);

        let cached = cache.find("Contact", &1.into()).unwrap();
        assert_eq!(cached.dependent_collections(), ["c".to_owned()]);
        assert!(cache.find("Contact", &2.into()).is_none());
    }

    #[test]
    fn no_back_references_without_flag() {
        let cache = ProcessCache::default();
        cache.add("Contact", 1.into(), entry(3));
        cache.store_collection("c", "Contact", vec![1.into()], &[], false);

        let cached = cache.find("Contact", &1.into()).unwrap();
        assert!(cached.dependent_collections().is_empty());

        cache.evict("Contact", &1.into());
        assert!(cache.load_collection("c").is_some());
    }

    #[test]
    fn statistics_track_sizes() {
        let cache = ProcessCache::default();
        cache.add("Contact", 1.into(), entry(1));
        cache.store_collection("c", "Contact", vec![1.into()], &["Group"], true);
        assert_eq!(
            cache.statistics(),
            CacheStatistics {
                objects: 1,
                collections: 1,
                dependency_classes: 2,
            }
        );

        cache.clear();
        assert_eq!(cache.statistics(), CacheStatistics::default());
    }

    fn registrations(cache: &ProcessCache, class_name: &str) -> usize {
        cache.dependencies.lock().dependents(class_name).count()
    }

    #[test]
    fn capacity_eviction_unregisters_collections() {
        let cache = ProcessCache::new(&ProcessCacheConfig::new().max_collections(10));
        for i in 0..1_000i64 {
            let key = format!("Contact where Id = {i}");
            cache.store_collection(&key, "Contact", vec![i.into()], &["Group"], false);
        }

        assert_eq!(cache.collections.len(), 10);
        assert_eq!(registrations(&cache, "Contact"), 10);
        assert_eq!(registrations(&cache, "Group"), 10);
        assert_eq!(cache.dependencies.lock().collection_count(), 10);
    }

    #[test]
    fn every_removal_path_unregisters() {
        let cache = ProcessCache::default();
        cache.add("Contact", 1.into(), entry(1));
        cache.store_collection("by-member", "Contact", vec![1.into()], &["Group"], true);
        cache.store_collection("explicit", "Contact", vec![2.into()], &[], false);

        cache.evict("Contact", &1.into());
        cache.evict_collection("explicit");

        assert_eq!(registrations(&cache, "Contact"), 0);
        assert_eq!(registrations(&cache, "Group"), 0);
        assert_eq!(cache.statistics().dependency_classes, 0);
    }

    #[test]
    fn invalidation_drops_other_class_registrations() {
        let cache = ProcessCache::default();
        cache.store_collection("c", "Contact", Vec::new(), &["Group"], false);

        cache.invalidate("Contact", &1.into(), InvalidateReason::Updated);

        assert_eq!(registrations(&cache, "Group"), 0);
        assert_eq!(cache.statistics().dependency_classes, 0);
    }

    #[test]
    fn expired_collections_unregister() {
        let cache = ProcessCache::new(
            &ProcessCacheConfig::new().time_to_live(Duration::from_millis(30)),
        );
        cache.store_collection("c", "Contact", Vec::new(), &[], false);
        std::thread::sleep(Duration::from_millis(60));

        assert!(cache.load_collection("c").is_none());
        assert_eq!(registrations(&cache, "Contact"), 0);
    }

    #[test]
    fn zero_capacity_registers_nothing() {
        let cache = ProcessCache::new(&ProcessCacheConfig::new().max_collections(0));
        cache.store_collection("c", "Contact", Vec::new(), &["Group"], false);
        assert_eq!(cache.statistics().dependency_classes, 0);
    }

    #[test]
    fn lock_section_sees_its_own_writes() {
        let cache = ProcessCache::default();
        let mut lock = cache.lock();
        lock.add("Contact", 7.into(), entry(1));
        assert!(lock.find("Contact", &7.into()).is_some());
        lock.invalidate("Contact", &7.into(), InvalidateReason::Deleted);
        assert!(lock.find("Contact", &7.into()).is_none());
        cache.unlock(lock);
    }
}
