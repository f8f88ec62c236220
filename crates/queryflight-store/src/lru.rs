//! Bounded least-recently-used store with O(1) operations
//!
//! Nodes live in a `Vec` arena linked by integer handles, with a `HashMap`
//! indexing keys to slots and a free list recycling removed slots. Head is
//! most-recently-used, tail least-recently-used. No unsafe code.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel value for null links in the doubly-linked list.
const NIL: usize = usize::MAX;

/// A node in the arena-based doubly-linked list.
///
/// `value` is an `Option` so removal and eviction can move the value out
/// while the slot sits on the free list; every in-list node holds `Some`.
struct Node<K, V> {
    key: K,
    value: Option<V>,
    prev: usize,
    next: usize,
}

/// Fixed-capacity associative store with least-recently-used eviction
///
/// - `get` promotes the accessed key to most-recently-used
/// - `insert` evicts the least-recently-used entry before inserting a new
///   key at capacity; updating an existing key never evicts
/// - `peek` and `contains` leave recency untouched
/// - absence is `None`/`false`, never an error
///
/// All lookup and mutating operations are O(1) amortized.
pub struct LruStore<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    arena: Vec<Node<K, V>>,
    head: usize,
    tail: usize,
    free: usize,
}

impl<K, V> std::fmt::Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruStore")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruStore<K, V> {
    /// Create a store with the given maximum capacity
    ///
    /// # Panics
    /// Panics if `capacity` is 0; that is a usage defect, reported at the
    /// call boundary rather than deferred into later operations.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruStore capacity must be > 0");
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            arena: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: NIL,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// True if `key` is present; recency is untouched
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Look up `key` and promote it to most-recently-used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.arena[idx].value.as_ref()
    }

    /// Look up `key` without touching recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.arena[idx].value.as_ref()
    }

    /// Insert or overwrite `key`, returning the entry evicted to make room
    ///
    /// Overwriting an existing key promotes it and never evicts another
    /// entry. A new key inserted at capacity first evicts the
    /// least-recently-used entry, which is returned to the caller.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            self.arena[idx].value = Some(value);
            self.promote(idx);
            return None;
        }

        let evicted = if self.map.len() == self.capacity {
            self.evict_tail()
        } else {
            None
        };

        let idx = self.alloc(key.clone(), value);
        self.map.insert(key, idx);
        self.push_front(idx);
        evicted
    }

    /// Remove `key`, returning its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.detach(idx);
        Some(self.release(idx))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.map.clear();
        self.arena.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
    }

    /// Iterate `(key, value)` pairs from most- to least-recently-used
    pub fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            arena: &self.arena,
            next: self.head,
        }
    }

    /// Iterate keys from most- to least-recently-used
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries().map(|(k, _)| k)
    }

    /// Iterate values from most- to least-recently-used
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries().map(|(_, v)| v)
    }

    /// Move `idx` to the head of the recency list.
    fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.detach(idx);
        self.push_front(idx);
    }

    /// Unlink `idx` from the recency list.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = &self.arena[idx];
            (node.prev, node.next)
        };
        if prev != NIL {
            self.arena[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.arena[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.arena[idx].prev = NIL;
        self.arena[idx].next = NIL;
    }

    /// Link `idx` as the new head.
    fn push_front(&mut self, idx: usize) {
        self.arena[idx].prev = NIL;
        self.arena[idx].next = self.head;
        if self.head != NIL {
            self.arena[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    /// Remove and return the least-recently-used entry.
    fn evict_tail(&mut self) -> Option<(K, V)> {
        let idx = self.tail;
        if idx == NIL {
            return None;
        }
        let key = self.arena[idx].key.clone();
        self.map.remove(&key);
        self.detach(idx);
        let value = self.release(idx);
        Some((key, value))
    }

    /// Take a slot from the free list or grow the arena.
    fn alloc(&mut self, key: K, value: V) -> usize {
        if self.free != NIL {
            let idx = self.free;
            self.free = self.arena[idx].next;
            self.arena[idx] = Node {
                key,
                value: Some(value),
                prev: NIL,
                next: NIL,
            };
            idx
        } else {
            self.arena.push(Node {
                key,
                value: Some(value),
                prev: NIL,
                next: NIL,
            });
            self.arena.len() - 1
        }
    }

    /// Move the value out of a detached slot and recycle it.
    fn release(&mut self, idx: usize) -> V {
        let value = self.arena[idx]
            .value
            .take()
            .expect("detached node holds a value");
        self.arena[idx].next = self.free;
        self.free = idx;
        value
    }
}

/// Iterator over `(key, value)` pairs, most- to least-recently-used
pub struct Entries<'a, K, V> {
    arena: &'a [Node<K, V>],
    next: usize,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NIL {
            return None;
        }
        let node = &self.arena[self.next];
        self.next = node.next;
        let value = node.value.as_ref().expect("linked node holds a value");
        Some((&node.key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut store = LruStore::new(10);
        store.insert("key", "value");
        assert_eq!(store.get("key"), Some(&"value"));
        assert_eq!(store.get("naba"), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.keys().collect::<Vec<_>>(), [&"key"]);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_is_a_defect() {
        let _ = LruStore::<String, i32>::new(0);
    }

    #[test]
    fn test_overwrite_promotes_to_head() {
        let mut store = LruStore::new(4);
        store.insert("a", "A");
        store.insert("b", "B");
        store.insert("c", "C");
        store.insert("a", "A2");
        assert_eq!(store.values().collect::<Vec<_>>(), [&"A2", &"C", &"B"]);
    }

    #[test]
    fn test_evicts_least_recently_set() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        store.insert("b", "B");
        store.insert("c", "C");
        assert_eq!(store.get("c"), Some(&"C"));
        assert_eq!(store.get("b"), Some(&"B"));
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        store.insert("b", "B");
        store.get("a");
        store.insert("c", "C");
        assert_eq!(store.get("c"), Some(&"C"));
        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(&"A"));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        store.insert("b", "B");
        assert_eq!(store.peek("a"), Some(&"A"));
        store.insert("c", "C");
        // "a" stayed least-recently-used despite the peek
        assert_eq!(store.peek("a"), None);
        assert_eq!(store.peek("b"), Some(&"B"));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        store.insert("b", "B");
        assert!(store.insert("a", "A2").is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.peek("b"), Some(&"B"));
    }

    #[test]
    fn test_insert_returns_evicted_pair() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        store.insert("b", "B");
        assert_eq!(store.insert("c", "C"), Some(("a", "A")));
    }

    #[test]
    fn test_remove() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        assert_eq!(store.remove("a"), Some("A"));
        assert_eq!(store.get("a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = LruStore::new(2);
        store.insert("a", "A");
        assert_eq!(store.remove("b"), None);
        assert_eq!(store.get("a"), Some(&"A"));
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut store = LruStore::new(3);
        store.insert("a", "A");
        store.insert("b", "B");
        store.insert("c", "C");
        store.remove("b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys().collect::<Vec<_>>(), [&"c", &"a"]);
    }

    #[test]
    fn test_slot_reuse_after_churn() {
        let mut store = LruStore::new(3);
        for i in 0..100 {
            store.insert(i.to_string(), i.to_string());
        }
        assert_eq!(store.len(), 3);
        // evicted slots are recycled through the free list
        assert!(store.arena.len() <= 3);
        let values: Vec<_> = store.values().cloned().collect();
        assert_eq!(values, ["99", "98", "97"]);
    }

    #[test]
    fn test_clear() {
        let mut store = LruStore::new(3);
        store.insert("a", "A");
        store.insert("b", "B");
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);
        assert!(store.keys().next().is_none());
    }

    #[test]
    fn test_entries_in_recency_order() {
        let mut store = LruStore::new(3);
        store.insert("a", "A");
        store.insert("b", "B");
        store.insert("c", "C");
        assert_eq!(
            store.entries().collect::<Vec<_>>(),
            [(&"c", &"C"), (&"b", &"B"), (&"a", &"A")]
        );

        store.get("a");
        assert_eq!(store.keys().collect::<Vec<_>>(), [&"a", &"c", &"b"]);
    }

    #[test]
    fn test_contains() {
        let mut store = LruStore::new(3);
        store.insert("a", "A");
        assert!(store.contains("a"));
        assert!(!store.contains("d"));
    }

    #[test]
    fn test_borrowed_key_lookups() {
        let mut store: LruStore<String, i32> = LruStore::new(2);
        store.insert("a".to_string(), 1);
        assert_eq!(store.get("a"), Some(&1));
        assert_eq!(store.peek("a"), Some(&1));
        assert!(store.contains("a"));
        assert_eq!(store.remove("a"), Some(1));
    }

    #[test]
    fn test_lru_order_property() {
        // inserting k1..k8 into capacity 5 keeps exactly the last 5,
        // most-recent first
        let mut store = LruStore::new(5);
        for i in 1..=8 {
            store.insert(format!("k{i}"), i);
        }
        let keys: Vec<_> = store.keys().cloned().collect();
        assert_eq!(keys, ["k8", "k7", "k6", "k5", "k4"]);
    }
}
