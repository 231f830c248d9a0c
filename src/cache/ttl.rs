//! Fixed-TTL key/value cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::Clock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Cache where every entry lives for the same `ttl`.
///
/// Entries are dropped lazily on `get` and eagerly by `purge_expired`.
///
/// Every invalidation bumps a generation counter. A reader that loads a
/// value outside the lock takes `generation()` first and stores it with
/// `insert_if_current`, so a load that raced an invalidation is dropped.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    // Only written with `entries` locked
    generation: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.lock().insert(key, CacheEntry { value, expires_at });
    }

    /// Current invalidation generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Insert only if nothing was invalidated since `generation` was read.
    /// Returns whether the value was stored.
    pub fn insert_if_current(&self, key: K, value: V, generation: u64) -> bool {
        let expires_at = self.clock.now() + self.ttl;
        let mut entries = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        entries.insert(key, CacheEntry { value, expires_at });
        true
    }

    /// Drop one key. Returns whether it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.lock();
        self.bump_generation();
        entries.remove(key).is_some()
    }

    /// Drop every key matching `predicate`. Returns how many were dropped.
    pub fn invalidate_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut entries = self.lock();
        self.bump_generation();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.lock();
        self.bump_generation();
        entries.clear();
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").field("ttl", &self.ttl).finish()
    }
}
