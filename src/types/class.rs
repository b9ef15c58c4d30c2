//! Schema metadata consumed by caching policy.

use serde::{Deserialize, Serialize};

use super::PrimaryKey;

/// Coarse size classification of a mapped class's table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Lookup tables: a handful to a few hundred rows.
    Small,
    #[default]
    Medium,
    Large,
}

/// What the cache layer needs to know about a mapped class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub cardinality: Cardinality,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            cardinality,
        }
    }
}

/// A materialized object as seen by caching policy.
pub trait CacheableObject {
    fn class_info(&self) -> &ClassInfo;

    fn primary_key(&self) -> PrimaryKey;
}

/// Why an object is being invalidated.
///
/// Passed through to the backend for diagnostics only; it never changes
/// what gets invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidateReason {
    Inserted,
    Updated,
    Deleted,
    AdminEvicted,
}

impl InvalidateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::AdminEvicted => "admin_evicted",
        }
    }
}
