//! Runtime facade: the backend and policy selected at startup.
//!
//! A [`CacheRuntime`] is built once and handed to the object-mapper layer.
//! Nothing is global; two runtimes in one process are independent.
//!
//! ```rust
//! use muninn::cache::ObjectCache;
//! use muninn::runtime::{CacheRuntime, CacheSettings};
//!
//! let settings = CacheSettings::new().backend("in-process").policy("small");
//! let runtime = CacheRuntime::builder().settings(settings).build();
//! assert_eq!(runtime.cache().statistics().objects, 0);
//! ```

mod builder;
mod settings;

pub use builder::{BackendFactory, CacheRuntimeBuilder, PolicyFactory};
pub use settings::{
    BACKEND_DISABLED, BACKEND_IN_PROCESS, CacheSettings, ENV_BACKEND, ENV_EXPIRATION_SECS,
    ENV_POLICY, ENV_SLIDING,
};

use std::sync::Arc;

use crate::Result;
use crate::cache::ObjectCache;
use crate::policy::CachingPolicy;
use crate::predicate::{self, Literal, Predicate};

/// The active cache backend and caching policy.
#[derive(Clone)]
pub struct CacheRuntime {
    settings: CacheSettings,
    cache: Arc<dyn ObjectCache>,
    policy: Arc<dyn CachingPolicy>,
}

impl CacheRuntime {
    pub fn builder() -> CacheRuntimeBuilder {
        CacheRuntimeBuilder::new()
    }

    /// Build from settings alone.
    pub fn from_settings(settings: CacheSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    pub fn cache(&self) -> &Arc<dyn ObjectCache> {
        &self.cache
    }

    pub fn policy(&self) -> &Arc<dyn CachingPolicy> {
        &self.policy
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Canonical cache key for the result of a query.
    ///
    /// See [`predicate::collection_key`].
    pub fn collection_key(
        &self,
        class_name: &str,
        predicate: &Predicate,
        params: &[Literal],
    ) -> Result<String> {
        predicate::collection_key(class_name, predicate, params)
    }
}

impl std::fmt::Debug for CacheRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRuntime")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
