//! Cached payloads: object rows and query results.

use std::sync::Arc;

use serde_json::Value;

use super::PrimaryKey;

/// Cached row data for one object.
///
/// `data_loaded_mask` records which columns are present (bit `i` set means
/// `data[i]` was loaded); objects may be cached partially loaded. The row
/// payload is shared, so clones are cheap.
///
/// Storing a new entry for the same key replaces the old one wholesale.
/// Callers that want an enriched entry read, merge and write it back
/// themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    data_loaded_mask: u64,
    data: Arc<[Value]>,
    dependent_collections: Vec<String>,
}

impl CacheEntry {
    pub fn new(data_loaded_mask: u64, data: impl Into<Arc<[Value]>>) -> Self {
        Self {
            data_loaded_mask,
            data: data.into(),
            dependent_collections: Vec::new(),
        }
    }

    pub fn data_loaded_mask(&self) -> u64 {
        self.data_loaded_mask
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// Whether column `index` was loaded.
    pub fn is_loaded(&self, index: usize) -> bool {
        index < 64 && self.data_loaded_mask & (1 << index) != 0
    }

    /// Keys of collections that hold this object and asked to be evicted
    /// along with it.
    pub fn dependent_collections(&self) -> &[String] {
        &self.dependent_collections
    }

    pub(crate) fn add_dependent_collection(&mut self, collection_key: &str) {
        if !self.dependent_collections.iter().any(|k| k == collection_key) {
            self.dependent_collections.push(collection_key.to_owned());
        }
    }
}

/// A materialized, ordered query result (sorting and limits already applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCollection {
    collection_key: String,
    root_class_name: String,
    primary_keys: Arc<[PrimaryKey]>,
}

impl CachedCollection {
    pub fn new(
        collection_key: impl Into<String>,
        root_class_name: impl Into<String>,
        primary_keys: impl Into<Arc<[PrimaryKey]>>,
    ) -> Self {
        Self {
            collection_key: collection_key.into(),
            root_class_name: root_class_name.into(),
            primary_keys: primary_keys.into(),
        }
    }

    pub fn collection_key(&self) -> &str {
        &self.collection_key
    }

    pub fn root_class_name(&self) -> &str {
        &self.root_class_name
    }

    pub fn primary_keys(&self) -> &[PrimaryKey] {
        &self.primary_keys
    }

    pub fn len(&self) -> usize {
        self.primary_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loaded_mask_bits() {
        let entry = CacheEntry::new(0b101, vec![json!(1), Value::Null, json!("x")]);
        assert!(entry.is_loaded(0));
        assert!(!entry.is_loaded(1));
        assert!(entry.is_loaded(2));
        assert!(!entry.is_loaded(64));
    }

    #[test]
    fn dependent_collections_are_deduplicated() {
        let mut entry = CacheEntry::new(1, vec![json!(1)]);
        entry.add_dependent_collection("Contact where true");
        entry.add_dependent_collection("Contact where true");
        entry.add_dependent_collection("Contact where 1 = 2");
        assert_eq!(entry.dependent_collections().len(), 2);
    }

    #[test]
    fn collection_preserves_key_order() {
        let keys: Vec<PrimaryKey> = vec![3.into(), 1.into(), 2.into()];
        let collection = CachedCollection::new("Contact where true", "Contact", keys.clone());
        assert_eq!(collection.primary_keys(), keys.as_slice());
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.root_class_name(), "Contact");
    }
}
