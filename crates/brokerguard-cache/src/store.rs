//! TTL store with prune-on-write and expire-on-read.
//!
//! ## Expiry
//!
//! An entry is expired once strictly more than `ttl` has elapsed since it was
//! recorded. Expired entries are never returned. They are reclaimed in three
//! places:
//!
//! - `record` sweeps the whole store after every write, which bounds memory
//!   for clients that present a fresh identity on every connection and are
//!   never queried again
//! - `query` removes the entry it finds expired
//! - [`sweep`](TtlStore::sweep) can be driven by a background task
//!
//! The write-side sweep is O(n) in the current store size.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::clock::{Clock, MonotonicClock};
use crate::digest::CacheKey;

/// Counters for one decision store.
///
/// `hits + misses` counts queries that reached the store; queries dropped by
/// the input guards never get here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries physically present, expired or not.
    pub size: usize,
    /// Queries answered with a fresh decision.
    pub hits: u64,
    /// Queries that found nothing or only a stale entry.
    pub misses: u64,
    /// Entries removed by a sweep or by an expired query.
    pub evictions: u64,
}

impl CacheStats {
    /// Queries that reached the store.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups answered from the store, or `None` before the
    /// first lookup.
    pub fn hit_ratio(&self) -> Option<f64> {
        match self.lookups() {
            0 => None,
            total => Some(self.hits as f64 / total as f64),
        }
    }
}

/// Stored decision with the instant it was recorded.
struct CacheEntry<D> {
    decision: D,
    recorded_at: Instant,
}

/// Returns `true` if an entry recorded at `recorded_at` is stale at `now`.
#[inline]
fn is_expired(recorded_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(recorded_at) > ttl
}

/// Concurrent map of digest to decision with time-based expiry.
///
/// The TTL is supplied on every call; the store itself holds no
/// configuration.
pub struct TtlStore<D> {
    entries: DashMap<CacheKey, CacheEntry<D>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<D> TtlStore<D>
where
    D: Clone + fmt::Debug,
{
    /// Create an empty store using the monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    /// Create an empty store with a custom time source.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Insert or refresh `key`, then prune every expired entry.
    ///
    /// Returns the number of entries the sweep removed.
    pub fn record(&self, key: CacheKey, decision: D, ttl: Duration) -> usize {
        let now = self.clock.now();

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                tracing::debug!(key = %occupied.key(), ?decision, "Updated cache entry");
                let entry = occupied.get_mut();
                entry.decision = decision;
                entry.recorded_at = now;
            }
            Entry::Vacant(vacant) => {
                tracing::debug!(key = %vacant.key(), ?decision, "Cached decision");
                vacant.insert(CacheEntry {
                    decision,
                    recorded_at: now,
                });
            }
        }

        self.prune(now, ttl)
    }

    /// Look up `key`, removing it if it has expired.
    pub fn query(&self, key: &CacheKey, ttl: Duration) -> Option<D> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key) {
            if !is_expired(entry.recorded_at, now, ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.decision.clone());
            }
            let stale_at = entry.recorded_at;
            drop(entry);

            // Only drop the entry we judged stale; a concurrent record may
            // have refreshed it in between.
            if self
                .entries
                .remove_if(key, |_, e| e.recorded_at == stale_at)
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Expired cache entry");
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Remove every entry older than `ttl`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, ttl: Duration) -> usize {
        self.prune(self.clock.now(), ttl)
    }

    fn prune(&self, now: Instant, ttl: Duration) -> usize {
        let mut removed = 0;

        self.entries.retain(|key, entry| {
            if is_expired(entry.recorded_at, now, ttl) {
                tracing::debug!(key = %key, "Cleanup expired entry");
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }

        removed
    }

    /// Number of entries physically present, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get store statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<D> Default for TtlStore<D>
where
    D: Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
