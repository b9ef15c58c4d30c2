//! Arena-backed LRU store.
//!
//! Nodes live in a `Vec` of slots and link to each other by slot index, so
//! the recency list needs no shared ownership. A `HashMap` maps keys to
//! slots. Vacated slots are recycled through a free list.
//!
//! Because every deadline is computed as `touch time + one store-wide TTL`,
//! recency order and expiration order coincide under sliding expiration:
//! once a node is found expired, every node behind it (toward the tail) is
//! at least as stale. Reads and sweeps rely on this to reclaim the whole
//! stale suffix in one pass.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{LruConfig, LruListener, RemovalCause};
use crate::telemetry;
use crate::{MuninnError, Result};

const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    expires_at: Instant,
    use_count: u64,
    prev: usize,
    next: usize,
}

struct Arena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: usize,
    tail: usize,
    next_sweep: Instant,
}

impl<K, V> Arena<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn new(next_sweep: Instant) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
            next_sweep,
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<K, V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn is_expired(&self, idx: usize, now: Instant) -> bool {
        self.node(idx).is_some_and(|n| now >= n.expires_at)
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.node(idx).map(|n| (n.prev, n.next)) else {
            return;
        };
        match self.node_mut(prev) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match self.node_mut(next) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = NIL;
            node.next = old_head;
        }
        match self.node_mut(old_head) {
            Some(h) => h.prev = idx,
            None => self.tail = idx,
        }
        self.head = idx;
    }

    fn touch(&mut self, idx: usize, now: Instant, config: &LruConfig) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
        if let Some(node) = self.node_mut(idx) {
            node.use_count += 1;
            if config.sliding_expiration {
                node.expires_at = now + config.time_to_live;
            }
        }
    }

    fn insert_front(&mut self, key: K, value: V, expires_at: Instant) {
        let node = Node {
            key: key.clone(),
            value,
            expires_at,
            use_count: 0,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_front(idx);
    }

    fn take(&mut self, idx: usize) -> Option<Node<K, V>> {
        self.unlink(idx);
        let node = self.slots.get_mut(idx)?.take()?;
        self.index.remove(&node.key);
        self.free.push(idx);
        self.compact_if_empty();
        Some(node)
    }

    /// Detach `idx` and everything tail-ward of it.
    fn truncate_from(
        &mut self,
        idx: usize,
        cause: RemovalCause,
        notes: &mut Notifications<K, V>,
    ) -> usize {
        let Some(new_tail) = self.node(idx).map(|n| n.prev) else {
            return 0;
        };
        match self.node_mut(new_tail) {
            Some(n) => n.next = NIL,
            None => self.head = NIL,
        }
        self.tail = new_tail;

        let mut removed = 0;
        let mut cur = idx;
        while let Some(node) = self.slots.get_mut(cur).and_then(Option::take) {
            self.free.push(cur);
            cur = node.next;
            self.index.remove(&node.key);
            notes.removed(node.key, node.value, cause);
            removed += 1;
        }
        self.compact_if_empty();
        removed
    }

    /// Scan from the head and cut at the first expired node.
    fn sweep(&mut self, now: Instant, notes: &mut Notifications<K, V>) -> usize {
        let mut cur = self.head;
        while let Some(node) = self.node(cur) {
            if now >= node.expires_at {
                return self.truncate_from(cur, RemovalCause::Expired, notes);
            }
            cur = node.next;
        }
        0
    }

    fn compact_if_empty(&mut self) {
        if self.index.is_empty() {
            self.slots.clear();
            self.free.clear();
            self.head = NIL;
            self.tail = NIL;
        }
    }
}

enum Event<K, V> {
    Added(K, V),
    Used(K, V),
    Removed(K, V, RemovalCause),
}

/// Outbox filled under the monitor and drained after it is released.
struct Notifications<K, V> {
    listening: bool,
    changed: bool,
    removed: [u64; 3],
    events: Vec<Event<K, V>>,
}

impl<K: Clone, V: Clone> Notifications<K, V> {
    fn added(&mut self, key: &K, value: &V) {
        self.changed = true;
        if self.listening {
            self.events.push(Event::Added(key.clone(), value.clone()));
        }
    }

    fn used(&mut self, key: &K, value: &V) {
        if self.listening {
            self.events.push(Event::Used(key.clone(), value.clone()));
        }
    }

    fn removed(&mut self, key: K, value: V, cause: RemovalCause) {
        self.changed = true;
        self.removed[cause.slot()] += 1;
        if self.listening {
            self.events.push(Event::Removed(key, value, cause));
        }
    }
}

/// Capacity- and time-bounded cache ordered by recency.
///
/// Thread-safe: the arena and its index are guarded by a single monitor,
/// held for every structural change (including the reorder on a read).
pub struct LruStore<K, V> {
    name: &'static str,
    config: LruConfig,
    arena: Mutex<Arena<K, V>>,
    listener: Option<Arc<dyn LruListener<K, V>>>,
}

impl<K, V> LruStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create a store. `name` labels its metrics and log lines.
    pub fn new(name: &'static str, config: LruConfig) -> Self {
        let next_sweep = Instant::now() + config.sweep_interval;
        Self {
            name,
            config,
            arena: Mutex::new(Arena::new(next_sweep)),
            listener: None,
        }
    }

    /// Create a store that reports added/used/removed items to `listener`.
    pub fn with_listener(
        name: &'static str,
        config: LruConfig,
        listener: Arc<dyn LruListener<K, V>>,
    ) -> Self {
        Self {
            listener: Some(listener),
            ..Self::new(name, config)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &LruConfig {
        &self.config
    }

    /// Look up a live item and mark it most recently used.
    ///
    /// An expired item is reported as a miss, and it is reclaimed together
    /// with every item behind it in recency order.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut notes = self.notifications();
        let (value, len) = {
            let mut arena = self.arena.lock();
            let value = match arena.index.get(key).copied() {
                None => None,
                Some(idx) if arena.is_expired(idx, now) => {
                    let removed = arena.truncate_from(idx, RemovalCause::Expired, &mut notes);
                    trace!(store = self.name, ?key, removed, "expired on read");
                    None
                }
                Some(idx) => {
                    arena.touch(idx, now, &self.config);
                    let value = arena.node(idx).map(|n| n.value.clone());
                    if let Some(v) = &value {
                        notes.used(key, v);
                    }
                    value
                }
            };
            (value, arena.index.len())
        };
        if value.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "store" => self.name).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "store" => self.name).increment(1);
        }
        self.dispatch(notes, len);
        value
    }

    /// Insert or overwrite an item.
    ///
    /// Overwriting a live item touches it and reports the prior value as
    /// used. Overwriting an expired item reclaims it first and admits the
    /// new value fresh.
    pub fn set(&self, key: K, value: V) {
        let now = Instant::now();
        let mut notes = self.notifications();
        let len = {
            let mut arena = self.arena.lock();
            match arena.index.get(&key).copied() {
                Some(idx) if !arena.is_expired(idx, now) => {
                    let prior = arena
                        .node_mut(idx)
                        .map(|n| std::mem::replace(&mut n.value, value));
                    arena.touch(idx, now, &self.config);
                    if let Some(prior) = &prior {
                        notes.used(&key, prior);
                    }
                }
                Some(idx) => {
                    arena.truncate_from(idx, RemovalCause::Expired, &mut notes);
                    self.admit(&mut arena, key, value, now, &mut notes);
                }
                None => self.admit(&mut arena, key, value, now, &mut notes),
            }
            arena.index.len()
        };
        self.dispatch(notes, len);
    }

    /// Insert an item that must not already be live.
    ///
    /// Runs the lazy sweep when it is due and evicts the least recently
    /// used item when the store is full.
    pub fn add(&self, key: K, value: V) -> Result<()> {
        let now = Instant::now();
        let mut notes = self.notifications();
        let len = {
            let mut arena = self.arena.lock();
            if let Some(idx) = arena.index.get(&key).copied() {
                if !arena.is_expired(idx, now) {
                    return Err(MuninnError::DuplicateKey(format!("{key:?}")));
                }
                arena.truncate_from(idx, RemovalCause::Expired, &mut notes);
            }
            self.admit(&mut arena, key, value, now, &mut notes);
            arena.index.len()
        };
        self.dispatch(notes, len);
        Ok(())
    }

    /// Mutate a live item in place without touching recency or expiration.
    ///
    /// Returns false when the key is absent or expired.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        let now = Instant::now();
        let mut arena = self.arena.lock();
        let Some(idx) = arena.index.get(key).copied() else {
            return false;
        };
        if arena.is_expired(idx, now) {
            return false;
        }
        match arena.node_mut(idx) {
            Some(node) => {
                f(&mut node.value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut notes = self.notifications();
        let (value, len) = {
            let mut arena = self.arena.lock();
            let node = arena.index.get(key).copied().and_then(|idx| arena.take(idx));
            let value = node.map(|node| {
                let value = node.value.clone();
                notes.removed(node.key, node.value, RemovalCause::Explicit);
                value
            });
            (value, arena.index.len())
        };
        self.dispatch(notes, len);
        value
    }

    /// Drop every item. Listeners are not notified.
    pub fn clear(&self) {
        let mut arena = self.arena.lock();
        arena.index.clear();
        arena.compact_if_empty();
        arena.next_sweep = Instant::now() + self.config.sweep_interval;
        drop(arena);
        metrics::gauge!(telemetry::CACHE_ENTRIES, "store" => self.name).set(0.0);
    }

    /// Reclaim the first contiguous run of expired items found from the
    /// head. Returns how many items were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut notes = self.notifications();
        let (swept, len) = {
            let mut arena = self.arena.lock();
            let swept = arena.sweep(now, &mut notes);
            arena.next_sweep = now + self.config.sweep_interval;
            (swept, arena.index.len())
        };
        if swept > 0 {
            debug!(store = self.name, swept, remaining = len, "swept expired items");
        }
        self.dispatch(notes, len);
        swept
    }

    /// Number of items held, including expired items not yet reclaimed.
    pub fn len(&self) -> usize {
        self.arena.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is held. Does not touch the item or check expiration.
    pub fn contains_key(&self, key: &K) -> bool {
        self.arena.lock().index.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        let arena = self.arena.lock();
        let mut keys = Vec::with_capacity(arena.index.len());
        let mut cur = arena.head;
        while let Some(node) = arena.node(cur) {
            keys.push(node.key.clone());
            cur = node.next;
        }
        keys
    }

    /// How many times `key` was touched since it was admitted.
    pub fn use_count(&self, key: &K) -> Option<u64> {
        let arena = self.arena.lock();
        let idx = arena.index.get(key).copied()?;
        arena.node(idx).map(|n| n.use_count)
    }

    fn admit(
        &self,
        arena: &mut Arena<K, V>,
        key: K,
        value: V,
        now: Instant,
        notes: &mut Notifications<K, V>,
    ) {
        if now >= arena.next_sweep {
            let swept = arena.sweep(now, notes);
            arena.next_sweep = now + self.config.sweep_interval;
            if swept > 0 {
                debug!(store = self.name, swept, "lazy sweep reclaimed expired items");
            }
        }
        if let Some(max_items) = self.config.max_items {
            while arena.index.len() >= max_items {
                let tail = arena.tail;
                let Some(node) = arena.take(tail) else {
                    break;
                };
                trace!(store = self.name, key = ?node.key, "evicted least recently used item");
                notes.removed(node.key, node.value, RemovalCause::Capacity);
            }
            if max_items == 0 {
                return;
            }
        }
        notes.added(&key, &value);
        arena.insert_front(key, value, now + self.config.time_to_live);
    }

    fn notifications(&self) -> Notifications<K, V> {
        Notifications {
            listening: self.listener.is_some(),
            changed: false,
            removed: [0; 3],
            events: Vec::new(),
        }
    }

    fn dispatch(&self, notes: Notifications<K, V>, len: usize) {
        for cause in RemovalCause::ALL {
            let count = notes.removed[cause.slot()];
            if count > 0 {
                metrics::counter!(telemetry::LRU_EVICTIONS_TOTAL,
                    "store" => self.name,
                    "cause" => cause.as_str(),
                )
                .increment(count);
            }
        }
        if notes.changed {
            metrics::gauge!(telemetry::CACHE_ENTRIES, "store" => self.name).set(len as f64);
        }
        let Some(listener) = &self.listener else {
            return;
        };
        for event in notes.events {
            match event {
                Event::Added(key, value) => listener.on_added(&key, &value),
                Event::Used(key, value) => listener.on_used(&key, &value),
                Event::Removed(key, value, cause) => listener.on_removed(&key, &value, cause),
            }
        }
    }
}
