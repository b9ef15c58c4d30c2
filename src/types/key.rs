//! Identity keys for cached objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A primary-key value of a mapped class.
///
/// Tables key their rows by integers, strings, GUIDs or a combination of
/// columns, so the cache treats the key as an opaque value with structural
/// equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Int(i64),
    Text(String),
    Guid(Uuid),
    /// Multi-column key, in column order.
    Composite(Vec<PrimaryKey>),
}

impl PrimaryKey {
    /// Build a composite key from its parts.
    pub fn composite(parts: impl IntoIterator<Item = PrimaryKey>) -> Self {
        Self::Composite(parts.into_iter().collect())
    }

    /// Whether this key spans more than one column.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Guid(v) => write!(f, "{v}"),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<i32> for PrimaryKey {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for PrimaryKey {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for PrimaryKey {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for PrimaryKey {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for PrimaryKey {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

/// Identity of a cached object: class name plus primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    class_name: String,
    primary_key: PrimaryKey,
}

impl CacheKey {
    pub fn new(class_name: impl Into<String>, primary_key: impl Into<PrimaryKey>) -> Self {
        Self {
            class_name: class_name.into(),
            primary_key: primary_key.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.class_name, self.primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_equal_only_when_both_fields_match() {
        let a = CacheKey::new("Contact", 1);
        assert_eq!(a, CacheKey::new("Contact", 1i64));
        assert_ne!(a, CacheKey::new("Contact", 2));
        assert_ne!(a, CacheKey::new("Group", 1));
        assert_ne!(a, CacheKey::new("Contact", "1"));
    }

    #[test]
    fn keys_hash_consistently() {
        let mut set = HashSet::new();
        set.insert(CacheKey::new("Contact", 1));
        set.insert(CacheKey::new("Contact", 1));
        set.insert(CacheKey::new("Contact", "1"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_formats() {
        let guid = Uuid::nil();
        assert_eq!(CacheKey::new("Contact", 3).to_string(), "Contact[3]");
        assert_eq!(PrimaryKey::from(guid).to_string(), guid.to_string());
        let composite = PrimaryKey::composite([PrimaryKey::from(1), PrimaryKey::from("x")]);
        assert!(composite.is_composite());
        assert_eq!(composite.to_string(), "(1, x)");
    }
}
