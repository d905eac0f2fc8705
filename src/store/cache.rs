use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

type KeyLocks = Arc<std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    ImageLookup(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::ImageLookup(name) => write!(f, "image:{}", name),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
    last_used: u64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Monotonic access counter used for LRU ordering
    clock: u64,
}

/// Process-wide memoization cache
///
/// Unbounded and never-expiring unless a capacity or TTL is supplied. With a
/// capacity, inserting into a full cache evicts the least recently used entry.
/// Finding that entry scans the whole map, so a bounded insert is O(n).
///
/// [`Cache::lock_key`] serializes fills of the same key, which is what lets
/// [`cached!`](crate::cached) collapse concurrent misses into one computation.
#[derive(Clone)]
pub struct Cache<V> {
    inner: Arc<Mutex<CacheInner<V>>>,
    capacity: Option<usize>,
    key_locks: KeyLocks,
}

/// Exclusive hold on one cache key, released on drop
pub struct KeyGuard {
    key: String,
    key_locks: KeyLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map still references the lock: nobody is waiting on it
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

impl<V: Clone> Cache<V> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
            })),
            capacity,
            key_locks: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Waits until no other caller holds `key`, then holds it until the guard drops
    pub async fn lock_key(&self, key: &CacheKey) -> KeyGuard {
        let key = key.to_string();
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.clone()).or_default().clone()
        };

        KeyGuard {
            key,
            key_locks: self.key_locks.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Unbounded cache
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Retrieves a value from the cache by key
    ///
    /// Expired entries are dropped on access and reported as a miss.
    pub async fn get_from_cache(&self, key: &CacheKey) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let key = key.to_string();

        let expired = match inner.entries.get(&key) {
            Some(entry) => entry
                .expires_at
                .is_some_and(|deadline| Instant::now() >= deadline),
            None => return None,
        };

        if expired {
            inner.entries.remove(&key);
            tracing::debug!(key = %key, "Cache entry expired");
            return None;
        }

        inner.clock += 1;
        let tick = inner.clock;
        inner.entries.get_mut(&key).map(|entry| {
            entry.last_used = tick;
            entry.value.clone()
        })
    }

    /// Stores a value, evicting the least recently used entry when full
    pub async fn set_in_cache(&self, key: &CacheKey, value: V, ttl: Option<Duration>) {
        let mut inner = self.inner.lock().await;
        let key = key.to_string();

        if let Some(capacity) = self.capacity {
            if !inner.entries.contains_key(&key) && inner.entries.len() >= capacity {
                let victim = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(victim) = victim {
                    inner.entries.remove(&victim);
                    tracing::debug!(key = %victim, "Evicted least recently used cache entry");
                }
            }
        }

        inner.clock += 1;
        let last_used = inner.clock;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
                last_used,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}
