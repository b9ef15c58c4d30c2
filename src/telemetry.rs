//! Telemetry metric name constants.
//!
//! Centralised metric names for cache operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `store`: which LRU store: "objects" or "collections"
//! - `cause`: why an item left a store: "explicit", "capacity", "expired"
//! - `reason`: invalidation reason: "inserted", "updated", "deleted", "admin_evicted"

/// Total cache hits.
///
/// Labels: `store`.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total cache misses (absent or expired).
///
/// Labels: `store`.
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total items removed from an LRU store.
///
/// Labels: `store`, `cause`.
pub const LRU_EVICTIONS_TOTAL: &str = "muninn_lru_evictions_total";

/// Total object invalidations.
///
/// Labels: `reason`.
pub const INVALIDATIONS_TOTAL: &str = "muninn_cache_invalidations_total";

/// Live items per store after the last structural change.
///
/// Labels: `store`.
pub const CACHE_ENTRIES: &str = "muninn_cache_entries";

/// Store label for the object store.
pub const STORE_OBJECTS: &str = "objects";

/// Store label for the collection store.
pub const STORE_COLLECTIONS: &str = "collections";
