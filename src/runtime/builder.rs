//! Builder for the cache runtime.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::settings::{BACKEND_DISABLED, BACKEND_IN_PROCESS};
use super::{CacheRuntime, CacheSettings};
use crate::cache::{NoopCache, ObjectCache, ProcessCache, ProcessCacheConfig};
use crate::policy::{BuiltinPolicy, CachingPolicy, FixedTimeout, PolicyKind};

/// Creates a custom backend from the settings and the resolved policy.
pub type BackendFactory =
    Box<dyn Fn(&CacheSettings, &dyn CachingPolicy) -> Arc<dyn ObjectCache> + Send + Sync>;

/// Creates a custom policy from the settings.
pub type PolicyFactory = Box<dyn Fn(&CacheSettings) -> Arc<dyn CachingPolicy> + Send + Sync>;

/// Builder for [`CacheRuntime`].
pub struct CacheRuntimeBuilder {
    settings: CacheSettings,
    backends: HashMap<String, BackendFactory>,
    policies: HashMap<String, PolicyFactory>,
    cache: Option<Arc<dyn ObjectCache>>,
    policy: Option<Arc<dyn CachingPolicy>>,
}

impl CacheRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            settings: CacheSettings::default(),
            backends: HashMap::new(),
            policies: HashMap::new(),
            cache: None,
            policy: None,
        }
    }

    /// Use these settings to select the backend and policy.
    pub fn settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Make a custom backend selectable by `name`.
    pub fn register_backend(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&CacheSettings, &dyn CachingPolicy) -> Arc<dyn ObjectCache>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.backends.insert(name.into(), Box::new(factory));
        self
    }

    /// Make a custom policy selectable by `name`.
    pub fn register_policy(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&CacheSettings) -> Arc<dyn CachingPolicy> + Send + Sync + 'static,
    ) -> Self {
        self.policies.insert(name.into(), Box::new(factory));
        self
    }

    /// Use this backend instance, ignoring the backend selector.
    pub fn cache(mut self, cache: Arc<dyn ObjectCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use this policy instance, ignoring the policy selector.
    pub fn policy(mut self, policy: Arc<dyn CachingPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Resolve the policy, then the backend.
    ///
    /// Unknown selectors fall back to caching nothing.
    pub fn build(self) -> CacheRuntime {
        let policy = match self.policy {
            Some(policy) => policy,
            None => resolve_policy(&self.settings, &self.policies),
        };
        let cache = match self.cache {
            Some(cache) => cache,
            None => resolve_backend(&self.settings, policy.as_ref(), &self.backends),
        };
        debug!(
            backend = self.settings.backend.as_str(),
            policy = self.settings.policy.as_str(),
            "cache runtime ready"
        );
        CacheRuntime {
            settings: self.settings,
            cache,
            policy,
        }
    }
}

impl Default for CacheRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_policy(
    settings: &CacheSettings,
    custom: &HashMap<String, PolicyFactory>,
) -> Arc<dyn CachingPolicy> {
    let timeout = FixedTimeout::new(
        settings.expiration_timeout_duration(),
        settings.sliding_expiration,
    );
    if let Ok(kind) = settings.policy.parse::<PolicyKind>() {
        return Arc::new(BuiltinPolicy::new(kind).with_timeout(timeout));
    }
    if let Some(factory) = custom.get(&settings.policy) {
        return factory(settings);
    }
    debug!(
        policy = settings.policy.as_str(),
        "unknown caching policy, caching nothing"
    );
    Arc::new(BuiltinPolicy::new(PolicyKind::None).with_timeout(timeout))
}

fn resolve_backend(
    settings: &CacheSettings,
    policy: &dyn CachingPolicy,
    custom: &HashMap<String, BackendFactory>,
) -> Arc<dyn ObjectCache> {
    match settings.backend.as_str() {
        BACKEND_DISABLED => Arc::new(NoopCache::new()),
        BACKEND_IN_PROCESS => {
            let mut config = ProcessCacheConfig::new()
                .time_to_live(policy.expiration_timeout())
                .sliding_expiration(policy.sliding_expiration())
                .sweep_interval(settings.sweep_interval_duration());
            config.objects.max_items = settings.max_objects;
            config.collections.max_items = settings.max_collections;
            Arc::new(ProcessCache::new(&config))
        }
        name => match custom.get(name) {
            Some(factory) => factory(settings, policy),
            None => {
                debug!(backend = name, "unknown cache backend, caching disabled");
                Arc::new(NoopCache::new())
            }
        },
    }
}
