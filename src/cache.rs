//! TTL cache with LRU eviction and single-flight request coalescing.
//!
//! `Cache<T>` is the freshness core behind every fetcher: values live until
//! their per-entry TTL expires, the least-recently-accessed entry is evicted
//! when the capacity cap is reached, and concurrent misses for the same key
//! are coalesced onto a single upstream fetch via a shared future registered
//! in an in-flight map.
//!
//! Invariants:
//! - at most one outstanding fetch per key at any time;
//! - every caller coalesced onto a fetch receives the same resolved value or
//!   the same error;
//! - failures are never cached, so the next call after a failed fetch starts
//!   a fresh one;
//! - map reads/writes complete without an intervening await, so two callers
//!   can never both observe a miss and both start a fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use crate::error::AppError;

/// Default capacity cap, matching the size the server runs with.
pub const DEFAULT_CAPACITY: usize = 1000;

type InFlightFuture<T> = Shared<BoxFuture<'static, Result<T, AppError>>>;

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
    last_accessed: Instant,
}

/// Cumulative counters for one cache instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Live entries (including not-yet-detected expired ones).
    pub size: usize,
    /// `hits / (hits + misses)` over the cache's lifetime; `0.0` before the
    /// first request.
    pub hit_rate: f64,
}

struct Store<T> {
    entries: parking_lot::RwLock<HashMap<String, CacheEntry<T>>>,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Clone> Store<T> {
    fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) if Instant::now() >= entry.expires_at => {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache entry expired");
                None
            }
            Some(entry) => {
                entry.last_accessed = Instant::now();
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, key: &str, value: T, ttl: Duration) {
        let mut entries = self.entries.write();
        if !entries.contains_key(key) && entries.len() >= self.max_size {
            Self::evict_lru(&mut entries);
        }
        let now = Instant::now();
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_accessed: now,
            },
        );
    }

    /// Evict the single least-recently-accessed entry. The O(n) scan is fine
    /// at this scale (a handful of beaches per cache).
    fn evict_lru(entries: &mut HashMap<String, CacheEntry<T>>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            entries.remove(&key);
            debug!(key = %key, "evicted least-recently-used entry");
        }
    }
}

/// Generic string-keyed TTL cache with request coalescing.
///
/// Cheap to clone; clones share the same store and in-flight registry.
pub struct Cache<T> {
    store: Arc<Store<T>>,
    in_flight: Arc<DashMap<String, InFlightFuture<T>>>,
}

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> Default for Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `max_size` entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            store: Arc::new(Store {
                entries: parking_lot::RwLock::new(HashMap::new()),
                max_size,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Return the cached value if present and not expired.
    ///
    /// Expired entries are removed on detection and counted as misses; hits
    /// refresh the entry's LRU position.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<T> {
        self.store.get(key)
    }

    /// Insert or replace an entry, evicting the least-recently-accessed
    /// entry first when the cache is at capacity.
    pub fn set(&self, key: &str, value: T, ttl: Duration) {
        self.store.insert(key, value, ttl);
    }

    /// Remove a single entry unconditionally.
    pub fn clear(&self, key: &str) {
        self.store.entries.write().remove(key);
    }

    /// Primary entry point: return the cached value, or coalesce onto the
    /// outstanding fetch for `key`, or start a new fetch.
    ///
    /// N concurrent callers for the same missing key trigger exactly one
    /// invocation of `fetch`. On success the value is stored with `ttl` and
    /// handed to every waiter; on failure the error is handed to every
    /// waiter and nothing is cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        // The in-flight entry must be registered before the first await so
        // racing callers observe it instead of starting their own fetch.
        let shared = match self.in_flight.entry(key.to_owned()) {
            Entry::Occupied(outstanding) => {
                debug!(key = %key, "coalescing onto outstanding fetch");
                outstanding.get().clone()
            }
            Entry::Vacant(slot) => {
                let store = Arc::clone(&self.store);
                let in_flight = Arc::clone(&self.in_flight);
                let key = key.to_owned();
                let fetch = fetch();
                let shared: InFlightFuture<T> = async move {
                    let result = fetch.await;
                    if let Ok(value) = &result {
                        store.insert(&key, value.clone(), ttl);
                    }
                    // Settled either way; failures are not cached.
                    in_flight.remove(&key);
                    result
                }
                .boxed()
                .shared();
                slot.insert(shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Cumulative size and hit-rate statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.store.hits.load(Ordering::Relaxed);
        let misses = self.store.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        CacheStats {
            size: self.store.entries.read().len(),
            hit_rate,
        }
    }
}
