//! Shared in-memory map used for rate windows and cached responses.
//!
//! # Design Decisions
//! - Entries are replaced wholesale, never mutated in place, so readers see
//!   either the old or the new value
//! - `update` runs under the shard lock, which makes read-modify-write on a
//!   single key atomic
//! - Nothing survives a restart

use std::hash::Hash;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Map abstraction injected into the admission controller and the cache.
pub trait Store<K, V>: Send + Sync {
    /// Return a copy of the value stored under `key`.
    fn get(&self, key: &K) -> Option<V>;

    /// Store `value`, replacing any previous entry.
    fn insert(&self, key: K, value: V);

    /// Atomically compute the next value from the current one and store it.
    fn update(&self, key: K, f: &mut dyn FnMut(Option<&V>) -> V) -> V;

    /// Keep only the entries for which `keep` returns true.
    fn retain(&self, keep: &mut dyn FnMut(&K, &V) -> bool);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`Store`] backed by a sharded concurrent hash map.
#[derive(Debug)]
pub struct MemoryStore<K: Eq + Hash, V> {
    inner: DashMap<K, V>,
}

impl<K: Eq + Hash, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    fn update(&self, key: K, f: &mut dyn FnMut(Option<&V>) -> V) -> V {
        match self.inner.entry(key) {
            Entry::Occupied(mut occupied) => {
                let next = f(Some(occupied.get()));
                occupied.insert(next.clone());
                next
            }
            Entry::Vacant(vacant) => {
                let next = f(None);
                vacant.insert(next.clone());
                next
            }
        }
    }

    fn retain(&self, keep: &mut dyn FnMut(&K, &V) -> bool) {
        self.inner.retain(|k, v| keep(k, v));
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
