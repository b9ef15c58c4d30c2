//! Store notifications.

/// Why an item left an LRU store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Removed by key.
    Explicit,
    /// Least-recently-used item dropped to admit a new one.
    Capacity,
    /// Deadline passed; reclaimed by a read or a sweep.
    Expired,
}

impl RemovalCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Capacity => "capacity",
            Self::Expired => "expired",
        }
    }

    pub(crate) const ALL: [RemovalCause; 3] = [Self::Explicit, Self::Capacity, Self::Expired];

    pub(crate) fn slot(&self) -> usize {
        match self {
            Self::Explicit => 0,
            Self::Capacity => 1,
            Self::Expired => 2,
        }
    }
}

/// Observer of an [`LruStore`](super::LruStore).
///
/// Notifications are delivered synchronously on the calling thread, after
/// the store's own monitor has been released, so a listener may call into
/// other stores. `clear()` does not notify.
pub trait LruListener<K, V>: Send + Sync {
    fn on_added(&self, _key: &K, _value: &V) {}

    /// An existing item was read or overwritten. `value` is the value the
    /// item held before the touch.
    fn on_used(&self, _key: &K, _value: &V) {}

    fn on_removed(&self, _key: &K, _value: &V, _cause: RemovalCause) {}
}
