//! Generic LRU store with time-based expiration.
//!
//! [`LruStore`] maps keys to values in recency order, bounded by an optional
//! item count and a single store-wide time-to-live (absolute or sliding).
//! Expired items are reclaimed lazily: by the read that finds them, by the
//! periodic sweep piggybacked on inserts, or by an explicit
//! [`sweep()`](LruStore::sweep).
//!
//! Owners that need to react to items entering or leaving the store
//! register an [`LruListener`]; the process cache uses this to cascade
//! object removals to the collections that depend on them.

mod config;
mod listener;
mod store;

pub use config::LruConfig;
pub use listener::{LruListener, RemovalCause};
pub use store::LruStore;
