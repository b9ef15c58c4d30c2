//! Cache settings, read once at process start.
//!
//! Settings come from the `[cache]` table of a TOML file:
//!
//! ```toml
//! [cache]
//! backend = "in-process"        # disabled | in-process | <custom name>
//! policy = "small"              # none | all | small | small+medium | <custom name>
//! sliding_expiration = true
//! expiration_timeout_secs = 60
//! max_objects = 10000
//! max_collections = 1000
//! sweep_interval_secs = 60
//! ```
//!
//! A missing table or key takes the default, which is caching disabled.
//! Environment variables override the file:
//!
//! | Variable | Setting |
//! |---|---|
//! | `MUNINN_CACHE_BACKEND` | `backend` |
//! | `MUNINN_CACHE_POLICY` | `policy` |
//! | `MUNINN_CACHE_EXPIRATION_SECS` | `expiration_timeout_secs` |
//! | `MUNINN_CACHE_SLIDING` | `sliding_expiration` |

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{MuninnError, Result};

pub const BACKEND_DISABLED: &str = "disabled";
pub const BACKEND_IN_PROCESS: &str = "in-process";

pub const ENV_BACKEND: &str = "MUNINN_CACHE_BACKEND";
pub const ENV_POLICY: &str = "MUNINN_CACHE_POLICY";
pub const ENV_EXPIRATION_SECS: &str = "MUNINN_CACHE_EXPIRATION_SECS";
pub const ENV_SLIDING: &str = "MUNINN_CACHE_SLIDING";

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    cache: CacheSettings,
}

/// Backend and policy selection plus store sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Backend selector (default: "disabled").
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Policy selector (default: "none").
    #[serde(default = "default_policy")]
    pub policy: String,
    #[serde(default = "default_sliding")]
    pub sliding_expiration: bool,
    /// Item time-to-live in seconds (default: 60).
    #[serde(default = "default_expiration_secs")]
    pub expiration_timeout_secs: u64,
    /// Object store capacity; unbounded when absent.
    #[serde(default)]
    pub max_objects: Option<usize>,
    /// Collection store capacity; unbounded when absent.
    #[serde(default)]
    pub max_collections: Option<usize>,
    /// Minimum time between lazy sweeps in seconds (default: 60).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            policy: default_policy(),
            sliding_expiration: default_sliding(),
            expiration_timeout_secs: default_expiration_secs(),
            max_objects: None,
            max_collections: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_backend() -> String {
    BACKEND_DISABLED.to_string()
}

fn default_policy() -> String {
    "none".to_string()
}

fn default_sliding() -> bool {
    true
}

fn default_expiration_secs() -> u64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MuninnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str::<SettingsFile>(&content)
            .map(|file| file.cache)
            .map_err(|e| {
                MuninnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
            })
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<SettingsFile>(content)
            .map(|file| file.cache)
            .map_err(|e| MuninnError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Apply the `MUNINN_CACHE_*` environment variables that are set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Values that do not parse are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend.trim().to_string();
        }
        if let Some(policy) = lookup(ENV_POLICY) {
            self.policy = policy.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_EXPIRATION_SECS) {
            match raw.trim().parse() {
                Ok(secs) => self.expiration_timeout_secs = secs,
                Err(_) => debug!(var = ENV_EXPIRATION_SECS, value = %raw, "ignoring unparseable override"),
            }
        }
        if let Some(raw) = lookup(ENV_SLIDING) {
            match parse_flag(&raw) {
                Some(flag) => self.sliding_expiration = flag,
                None => debug!(var = ENV_SLIDING, value = %raw, "ignoring unparseable override"),
            }
        }
        self
    }

    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn sliding_expiration(mut self, enabled: bool) -> Self {
        self.sliding_expiration = enabled;
        self
    }

    /// Time-to-live in whole seconds, the unit the settings file uses.
    pub fn expiration_timeout_secs(mut self, secs: u64) -> Self {
        self.expiration_timeout_secs = secs;
        self
    }

    pub fn max_objects(mut self, n: usize) -> Self {
        self.max_objects = Some(n);
        self
    }

    pub fn max_collections(mut self, n: usize) -> Self {
        self.max_collections = Some(n);
        self
    }

    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }

    pub fn expiration_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.expiration_timeout_secs)
    }

    pub fn sweep_interval_duration(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_disable_caching() {
        let settings = CacheSettings::default();
        assert_eq!(settings.backend, "disabled");
        assert_eq!(settings.policy, "none");
        assert!(settings.sliding_expiration);
        assert_eq!(settings.expiration_timeout_secs, 60);
        assert_eq!(settings.max_objects, None);
    }

    #[test]
    fn parse_partial_table() {
        let settings = CacheSettings::from_toml_str(
            r#"
            [cache]
            backend = "in-process"
            policy = "small+medium"
            max_objects = 500
            "#,
        )
        .unwrap();
        assert_eq!(settings.backend, "in-process");
        assert_eq!(settings.policy, "small+medium");
        assert_eq!(settings.max_objects, Some(500));
        assert_eq!(settings.max_collections, None);
        assert_eq!(settings.sweep_interval_secs, 60);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(CacheSettings::from_toml_str("").unwrap(), CacheSettings::default());
    }

    #[test]
    fn overrides_apply_when_set() {
        let settings = CacheSettings::default().with_overrides_from(|name| match name {
            ENV_BACKEND => Some("in-process".into()),
            ENV_SLIDING => Some("off".into()),
            ENV_EXPIRATION_SECS => Some("not-a-number".into()),
            _ => None,
        });
        assert_eq!(settings.backend, "in-process");
        assert_eq!(settings.policy, "none");
        assert!(!settings.sliding_expiration);
        assert_eq!(settings.expiration_timeout_secs, 60);
    }
}
