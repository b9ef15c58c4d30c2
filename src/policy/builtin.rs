//! Built-in cardinality-based policies.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::CachingPolicy;
use crate::predicate::Predicate;
use crate::types::{CacheableObject, Cardinality, ClassInfo};
use crate::{MuninnError, Result};

/// Expiration settings shared by every built-in policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeout {
    pub timeout: Duration,
    pub sliding: bool,
}

impl Default for FixedTimeout {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            sliding: true,
        }
    }
}

impl FixedTimeout {
    pub fn new(timeout: Duration, sliding: bool) -> Self {
        Self { timeout, sliding }
    }
}

/// Which classes a built-in policy admits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Cache nothing.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Cache everything.
    #[serde(rename = "all")]
    All,
    /// Cache classes declared [`Cardinality::Small`].
    #[serde(rename = "small")]
    Small,
    /// Cache small and medium classes.
    #[serde(rename = "small+medium")]
    SmallAndMedium,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::Small => "small",
            Self::SmallAndMedium => "small+medium",
        }
    }

    pub fn admits(&self, cardinality: Cardinality) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Small => cardinality == Cardinality::Small,
            Self::SmallAndMedium => cardinality <= Cardinality::Medium,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = MuninnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "all" => Ok(Self::All),
            "small" => Ok(Self::Small),
            "small+medium" => Ok(Self::SmallAndMedium),
            other => Err(MuninnError::Configuration(format!(
                "unknown caching policy: {other}"
            ))),
        }
    }
}

/// A [`PolicyKind`] with a fixed expiration timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuiltinPolicy {
    pub kind: PolicyKind,
    pub timeout: FixedTimeout,
}

impl BuiltinPolicy {
    pub fn new(kind: PolicyKind) -> Self {
        Self {
            kind,
            timeout: FixedTimeout::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: FixedTimeout) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CachingPolicy for BuiltinPolicy {
    fn should_cache_object(&self, object: &dyn CacheableObject) -> bool {
        self.kind.admits(object.class_info().cardinality)
    }

    fn should_cache_collection(
        &self,
        class: &ClassInfo,
        _predicate: &Predicate,
        _order_by: Option<&str>,
        _limit: Option<usize>,
    ) -> bool {
        self.kind.admits(class.cardinality)
    }

    fn expiration_timeout(&self) -> Duration {
        self.timeout.timeout
    }

    fn sliding_expiration(&self) -> bool {
        self.timeout.sliding
    }
}
