//! Public data types for the Muninn cache.

mod class;
mod entry;
mod key;

pub use class::{CacheableObject, Cardinality, ClassInfo, InvalidateReason};
pub use entry::{CacheEntry, CachedCollection};
pub use key::{CacheKey, PrimaryKey};
