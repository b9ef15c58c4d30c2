//! Class → dependent collection registry.

use std::collections::{HashMap, HashSet};

/// Which cached collections depend on which classes.
///
/// A collection is registered under its root class and under every other
/// class its query touches (joined classes, classes named in the filter).
/// Invalidating a class takes its whole set: once any object of the class
/// changed, none of the collections registered under it can be trusted.
///
/// A collection that leaves the cache for any other reason is dropped from
/// every class it was registered under with [`unregister`](Self::unregister),
/// so the index never outgrows the collection store.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    by_class: HashMap<String, HashSet<String>>,
    by_collection: HashMap<String, HashSet<String>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class_name: &str, collection_key: &str) {
        self.by_class
            .entry(class_name.to_owned())
            .or_default()
            .insert(collection_key.to_owned());
        self.by_collection
            .entry(collection_key.to_owned())
            .or_default()
            .insert(class_name.to_owned());
    }

    /// Remove and return every collection key registered under `class_name`.
    ///
    /// The collections stay registered under their other classes until they
    /// are unregistered.
    pub fn take(&mut self, class_name: &str) -> HashSet<String> {
        let keys = self.by_class.remove(class_name).unwrap_or_default();
        for key in &keys {
            if let Some(classes) = self.by_collection.get_mut(key) {
                classes.remove(class_name);
                if classes.is_empty() {
                    self.by_collection.remove(key);
                }
            }
        }
        keys
    }

    /// Forget `collection_key` under every class. Returns whether it was
    /// registered at all.
    pub fn unregister(&mut self, collection_key: &str) -> bool {
        let Some(classes) = self.by_collection.remove(collection_key) else {
            return false;
        };
        for class_name in classes {
            if let Some(keys) = self.by_class.get_mut(&class_name) {
                keys.remove(collection_key);
                if keys.is_empty() {
                    self.by_class.remove(&class_name);
                }
            }
        }
        true
    }

    pub fn dependents(&self, class_name: &str) -> impl Iterator<Item = &str> {
        self.by_class
            .get(class_name)
            .into_iter()
            .flat_map(|keys| keys.iter().map(String::as_str))
    }

    pub fn is_registered(&self, class_name: &str, collection_key: &str) -> bool {
        self.by_class
            .get(class_name)
            .is_some_and(|keys| keys.contains(collection_key))
    }

    /// Number of classes with at least one registration.
    pub fn class_count(&self) -> usize {
        self.by_class.len()
    }

    /// Number of registered collections.
    pub fn collection_count(&self) -> usize {
        self.by_collection.len()
    }

    pub fn clear(&mut self) {
        self.by_class.clear();
        self.by_collection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mut index = DependencyIndex::new();
        index.register("Contact", "Contact where true");
        index.register("Contact", "Contact where true");
        assert_eq!(index.dependents("Contact").count(), 1);
        assert!(index.is_registered("Contact", "Contact where true"));
    }

    #[test]
    fn take_drops_the_whole_class() {
        let mut index = DependencyIndex::new();
        index.register("Contact", "a");
        index.register("Contact", "b");
        index.register("Group", "a");

        let taken = index.take("Contact");
        assert_eq!(taken.len(), 2);
        assert_eq!(index.dependents("Contact").count(), 0);
        assert!(index.is_registered("Group", "a"));
        assert_eq!(index.class_count(), 1);
    }

    #[test]
    fn unregister_forgets_every_class() {
        let mut index = DependencyIndex::new();
        index.register("Contact", "a");
        index.register("Group", "a");
        index.register("Contact", "b");

        assert!(index.unregister("a"));
        assert!(!index.is_registered("Contact", "a"));
        assert!(index.is_registered("Contact", "b"));
        assert_eq!(index.class_count(), 1);
        assert_eq!(index.collection_count(), 1);
        assert!(!index.unregister("a"));
    }

    #[test]
    fn take_then_unregister_leaves_nothing() {
        let mut index = DependencyIndex::new();
        index.register("Contact", "a");
        index.register("Group", "a");

        index.take("Contact");
        assert_eq!(index.collection_count(), 1);
        assert!(index.unregister("a"));
        assert_eq!(index.class_count(), 0);
        assert_eq!(index.collection_count(), 0);
    }

    #[test]
    fn take_unknown_class_is_empty() {
        let mut index = DependencyIndex::new();
        assert!(index.take("Nothing").is_empty());
    }
}
