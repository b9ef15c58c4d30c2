//! Muninn - in-process object and query-result cache for an object mapper
//!
//! This crate keeps deserialized rows (object entries) and query results
//! (ordered primary-key lists) in memory across transactions, and drops
//! every cached artifact that depended on a record as soon as the record
//! changes.
//!
//! # Example
//!
//! ```rust
//! use muninn::{
//!     CacheEntry, CacheRuntime, CacheSettings, InvalidateReason, ObjectCache, Predicate,
//! };
//! use serde_json::json;
//!
//! let runtime = CacheRuntime::builder()
//!     .settings(CacheSettings::new().backend("in-process").policy("all"))
//!     .build();
//! let cache = runtime.cache();
//!
//! cache.add("Contact", 1.into(), CacheEntry::new(0b11, vec![json!(1), json!("Mary")]));
//!
//! let key = runtime
//!     .collection_key("Contact", &Predicate::field_eq("Name", "Mary"), &[])
//!     .unwrap();
//! cache.store_collection(&key, "Contact", vec![1.into()], &[], true);
//! assert_eq!(cache.load_collection(&key), Some(vec![1.into()]));
//!
//! // Any change to a Contact drops every cached Contact query.
//! cache.invalidate("Contact", &2.into(), InvalidateReason::Updated);
//! assert_eq!(cache.load_collection(&key), None);
//! ```

pub mod cache;
pub mod error;
pub mod lru;
pub mod policy;
pub mod predicate;
pub mod runtime;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{
    CacheLock, CacheStatistics, DependencyIndex, LockedCache, NoopCache, ObjectCache,
    ProcessCache, ProcessCacheConfig, SingleResult,
};
pub use error::{MuninnError, Result};
pub use lru::{LruConfig, LruListener, LruStore, RemovalCause};
pub use policy::{BuiltinPolicy, CachingPolicy, FixedTimeout, PolicyKind};
pub use predicate::{CompareOp, Expr, Literal, Predicate, collection_key};
pub use runtime::{CacheRuntime, CacheRuntimeBuilder, CacheSettings};
pub use types::{
    CacheEntry, CacheKey, CacheableObject, CachedCollection, Cardinality, ClassInfo,
    InvalidateReason, PrimaryKey,
};
