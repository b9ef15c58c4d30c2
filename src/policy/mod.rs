//! Caching policy: which objects and query results are worth caching.
//!
//! The policy is consulted by the object-mapper layer before it stores
//! anything. The cache itself never rejects a store.

mod builtin;

pub use builtin::{BuiltinPolicy, FixedTimeout, PolicyKind};

use std::time::Duration;

use crate::predicate::Predicate;
use crate::types::{CacheableObject, ClassInfo};

/// Admission rules plus the expiration settings used to size the stores.
pub trait CachingPolicy: Send + Sync {
    /// Whether a freshly loaded object should be cached.
    fn should_cache_object(&self, object: &dyn CacheableObject) -> bool;

    /// Whether the result of a query should be cached.
    ///
    /// `order_by` and `limit` describe the query shape; built-in policies
    /// decide on the class alone.
    fn should_cache_collection(
        &self,
        class: &ClassInfo,
        predicate: &Predicate,
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> bool;

    fn expiration_timeout(&self) -> Duration;

    fn sliding_expiration(&self) -> bool;
}
