//! Authentication and authorization decision caches.
//!
//! [`DecisionCache`] couples a [`KeyDigest`] with a [`TtlStore`] and applies
//! the input guards: when caching is disabled, or either string is missing or
//! empty, writes are dropped and reads report no answer without hashing
//! anything. [`AuthCaches`] holds one independent instance per kind and
//! exposes the four operations broker hooks call.
//!
//! ```
//! use brokerguard_cache::{AccessMode, AuthCaches, Decision};
//!
//! let caches = AuthCaches::new(60);
//! caches.record_authorization("alice", "sensors/t1", AccessMode::Read, Decision::Allow);
//!
//! assert_eq!(
//!     caches.query_authorization("alice", "sensors/t1", AccessMode::Read),
//!     Some(Decision::Allow)
//! );
//! assert_eq!(caches.query_authorization("alice", "sensors/t1", AccessMode::Write), None);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::CacheResult;
use crate::clock::{Clock, MonotonicClock};
use crate::config::CacheConfig;
use crate::decision::{AccessMode, Decision};
use crate::digest::{CacheKey, KeyDigest, Sha256Digest};
use crate::store::{CacheStats, TtlStore};

/// Tag mixed into authentication keys, which have no access-mode dimension.
pub const AUTHENTICATION_TAG: i32 = 0;

/// Which decision a cache holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// `(identity, resource, access mode)` decisions.
    Authorization,
    /// `(identity, credential)` decisions.
    Authentication,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorization => write!(f, "authorization"),
            Self::Authentication => write!(f, "authentication"),
        }
    }
}

/// Time-bounded memo of decisions keyed by a digest of `(a, b, tag)`.
pub struct DecisionCache<D = Decision> {
    kind: CacheKind,
    ttl: Option<Duration>,
    digest: Arc<dyn KeyDigest>,
    store: TtlStore<D>,
}

impl<D> DecisionCache<D>
where
    D: Clone + fmt::Debug,
{
    /// Create a cache with SHA-256 keys and the monotonic clock.
    ///
    /// `ttl_seconds <= 0` yields a disabled cache.
    pub fn new(kind: CacheKind, ttl_seconds: i64) -> Self {
        Self::with_parts(
            kind,
            ttl_seconds,
            Arc::new(MonotonicClock),
            Arc::new(Sha256Digest),
        )
    }

    /// Create a cache with a custom clock and key digest.
    pub fn with_parts(
        kind: CacheKind,
        ttl_seconds: i64,
        clock: Arc<dyn Clock>,
        digest: Arc<dyn KeyDigest>,
    ) -> Self {
        Self {
            kind,
            ttl: CacheConfig::with_ttl_seconds(ttl_seconds).ttl(),
            digest,
            store: TtlStore::with_clock(clock),
        }
    }

    /// Which decisions this cache holds.
    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Configured lifetime, or `None` when disabled.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns `true` if this cache stores anything at all.
    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }

    /// Remember `decision` for `(a, b, tag)`.
    ///
    /// Silently does nothing if the cache is disabled, an input is missing or
    /// empty, or the key cannot be derived.
    pub fn record<'a>(
        &self,
        a: impl Into<Option<&'a str>>,
        b: impl Into<Option<&'a str>>,
        tag: i32,
        decision: D,
    ) {
        let Some((key, ttl)) = self.resolve_key(a.into(), b.into(), tag) else {
            return;
        };

        let pruned = self.store.record(key, decision, ttl);
        if pruned > 0 {
            tracing::debug!(kind = %self.kind, pruned, "Pruned expired decisions");
        }
    }

    /// Recall the decision for `(a, b, tag)` if one is cached and fresh.
    pub fn query<'a>(
        &self,
        a: impl Into<Option<&'a str>>,
        b: impl Into<Option<&'a str>>,
        tag: i32,
    ) -> Option<D> {
        let (key, ttl) = self.resolve_key(a.into(), b.into(), tag)?;
        self.store.query(&key, ttl)
    }

    fn resolve_key(
        &self,
        a: Option<&str>,
        b: Option<&str>,
        tag: i32,
    ) -> Option<(CacheKey, Duration)> {
        let ttl = self.ttl?;
        let a = a.filter(|s| !s.is_empty())?;
        let b = b.filter(|s| !s.is_empty())?;

        match self.digest.derive(a, b, tag) {
            Ok(key) => Some((key, ttl)),
            Err(e) => {
                tracing::warn!(
                    kind = %self.kind,
                    error = %e,
                    "Key derivation failed, treating as cache miss"
                );
                None
            }
        }
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        match self.ttl {
            Some(ttl) => self.store.sweep(ttl),
            None => 0,
        }
    }

    /// Number of entries physically present.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}

/// The authorization and authentication caches of one plugin instance.
///
/// The two caches share configuration but nothing else; each has its own
/// store and its own locking.
pub struct AuthCaches<D = Decision> {
    authorization: DecisionCache<D>,
    authentication: DecisionCache<D>,
}

impl<D> AuthCaches<D>
where
    D: Clone + fmt::Debug,
{
    /// Create both caches with the given lifetime in seconds.
    pub fn new(ttl_seconds: i64) -> Self {
        Self::with_parts(ttl_seconds, Arc::new(MonotonicClock), Arc::new(Sha256Digest))
    }

    /// Create both caches from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        tracing::info!(
            cache_seconds = config.cache_seconds,
            enabled = config.is_enabled(),
            "Decision caches configured"
        );
        Self::new(config.cache_seconds)
    }

    /// Validate `config` and create both caches from it.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if the configuration is invalid.
    pub fn try_from_config(config: &CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Create both caches sharing a custom clock and key digest.
    pub fn with_parts(
        ttl_seconds: i64,
        clock: Arc<dyn Clock>,
        digest: Arc<dyn KeyDigest>,
    ) -> Self {
        Self {
            authorization: DecisionCache::with_parts(
                CacheKind::Authorization,
                ttl_seconds,
                Arc::clone(&clock),
                Arc::clone(&digest),
            ),
            authentication: DecisionCache::with_parts(
                CacheKind::Authentication,
                ttl_seconds,
                clock,
                digest,
            ),
        }
    }

    /// Remember an ACL decision for `identity` accessing `resource`.
    pub fn record_authorization<'a>(
        &self,
        identity: impl Into<Option<&'a str>>,
        resource: impl Into<Option<&'a str>>,
        access: impl Into<AccessMode>,
        decision: D,
    ) {
        self.authorization
            .record(identity, resource, access.into().tag(), decision);
    }

    /// Recall a cached ACL decision.
    pub fn query_authorization<'a>(
        &self,
        identity: impl Into<Option<&'a str>>,
        resource: impl Into<Option<&'a str>>,
        access: impl Into<AccessMode>,
    ) -> Option<D> {
        self.authorization
            .query(identity, resource, access.into().tag())
    }

    /// Remember a credential check for `identity`.
    pub fn record_authentication<'a>(
        &self,
        identity: impl Into<Option<&'a str>>,
        credential: impl Into<Option<&'a str>>,
        decision: D,
    ) {
        self.authentication
            .record(identity, credential, AUTHENTICATION_TAG, decision);
    }

    /// Recall a cached credential check.
    pub fn query_authentication<'a>(
        &self,
        identity: impl Into<Option<&'a str>>,
        credential: impl Into<Option<&'a str>>,
    ) -> Option<D> {
        self.authentication
            .query(identity, credential, AUTHENTICATION_TAG)
    }

    /// The authorization cache.
    pub fn authorization(&self) -> &DecisionCache<D> {
        &self.authorization
    }

    /// The authentication cache.
    pub fn authentication(&self) -> &DecisionCache<D> {
        &self.authentication
    }

    /// Sweep both caches. Returns the total number of entries removed.
    pub fn sweep(&self) -> usize {
        self.authorization.sweep() + self.authentication.sweep()
    }
}
