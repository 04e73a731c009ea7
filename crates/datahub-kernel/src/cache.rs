//! Bounded least-recently-used cache.
//!
//! Entries live in a slab (`Vec`) threaded by an intrusive doubly-linked
//! recency list; a hash index maps keys to slab slots. `get` and `put` are
//! O(1). The cache is not synchronized: owners wrap it in a lock.
//!
//! Recency rules:
//!
//! - `get` of a present key marks it most-recently-used; a miss changes nothing.
//! - `put` of a new key at capacity evicts the least-recently-used key first.
//! - `put` of an existing key overwrites the value, never evicts, and marks
//!   the key most-recently-used.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

struct Slot<K, V> {
    key: K,
    value: V,
    /// Towards the most-recently-used end.
    prev: Option<usize>,
    /// Towards the least-recently-used end.
    next: Option<usize>,
}

/// Fixed-capacity LRU cache.
pub struct LruCache<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
    capacity: NonZeroUsize,
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.slots.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity.get()),
            slots: Vec::with_capacity(capacity.get()),
            head: None,
            tail: None,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look up a key and mark it most-recently-used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        Some(self.slots[idx].value.clone())
    }

    /// Membership test without touching recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert or overwrite; returns the entry evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            self.slots[idx].value = value;
            self.touch(idx);
            return None;
        }

        if self.slots.len() >= self.capacity.get()
            && let Some(idx) = self.tail
        {
            // Reuse the least-recently-used slot in place.
            self.unlink(idx);
            let evicted = std::mem::replace(
                &mut self.slots[idx],
                Slot {
                    key: key.clone(),
                    value,
                    prev: None,
                    next: None,
                },
            );
            self.index.remove(&evicted.key);
            self.index.insert(key, idx);
            self.push_front(idx);
            return Some((evicted.key, evicted.value));
        }

        let idx = self.slots.len();
        self.slots.push(Slot {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.index.insert(key, idx);
        self.push_front(idx);
        None
    }

    /// Remove a key, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        let last = self.slots.len() - 1;
        let removed = self.slots.swap_remove(idx);
        if idx != last {
            self.relocate(last, idx);
        }
        Some(removed.value)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most- to least-recently-used.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            cache: self,
            cursor: self.head,
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        match self.head {
            Some(h) => self.slots[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Fix links after `swap_remove` moved the slot at `from` into `to`.
    fn relocate(&mut self, from: usize, to: usize) {
        let (prev, next) = (self.slots[to].prev, self.slots[to].next);
        match prev {
            Some(p) => self.slots[p].next = Some(to),
            None => self.head = Some(to),
        }
        match next {
            Some(n) => self.slots[n].prev = Some(to),
            None => self.tail = Some(to),
        }
        if let Some(slot) = self.index.get_mut(&self.slots[to].key) {
            *slot = to;
        }
        debug_assert_ne!(from, to);
    }
}

/// Iterator returned by [`LruCache::keys`].
pub struct Keys<'a, K, V> {
    cache: &'a LruCache<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = &self.cache.slots[self.cursor?];
        self.cursor = slot.next;
        Some(&slot.key)
    }
}
