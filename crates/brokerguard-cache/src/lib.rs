//! # brokerguard-cache
//!
//! Short-lived decision cache for broker authentication and authorization
//! plugins.
//!
//! Every connect, publish, and subscribe request needs an allow/deny answer
//! from a policy backend (database, HTTP service, LDAP). This crate remembers
//! those answers for a bounded time so repeated requests skip the backend,
//! while revoked permissions still take effect once the TTL runs out.
//!
//! ## Modules
//!
//! - [`cache`] - Authorization and authentication caches and their four operations
//! - [`store`] - Concurrent TTL store with prune-on-write and expire-on-read
//! - [`digest`] - Fixed-width key derivation from identity tuples
//! - [`decision`] - Broker decision codes and access modes
//! - [`config`] - Cache configuration from TOML or plugin options
//! - [`clock`] - Monotonic and manual time sources
//! - [`cleanup`] - Optional background sweep task
//! - [`error`] - Error types
//!
//! The cache never decides policy and never fails a request: every problem
//! degrades to "no cached answer" and the caller asks its backend.

pub mod cache;
pub mod cleanup;
pub mod clock;
pub mod config;
pub mod decision;
pub mod digest;
pub mod error;
pub mod store;

pub use cache::{AUTHENTICATION_TAG, AuthCaches, CacheKind, DecisionCache};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::CacheConfig;
pub use decision::{AccessMode, Decision};
pub use digest::{CacheKey, KeyDigest, Sha256Digest};
pub use error::{CacheError, ConfigError};
pub use store::{CacheStats, TtlStore};

/// Type alias for results produced by this crate.
pub type CacheResult<T> = Result<T, CacheError>;
