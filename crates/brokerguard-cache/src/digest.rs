//! Cache key derivation.
//!
//! Inputs are never stored: each `(a, b, tag)` tuple is reduced to a
//! fixed-width SHA-256 digest rendered as uppercase hex. The canonical byte
//! sequence fed to the hash is length-prefixed, so no separator character in
//! an identity or topic can make two distinct tuples collide.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::CacheResult;

/// Length of a rendered key in hexadecimal characters.
pub const KEY_HEX_LEN: usize = 64;

/// Fixed-width digest used as the cache's lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-rendered hex digest.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives a cache key from two strings and an integer tag.
///
/// Implementations must be deterministic and must never fall back to the raw
/// input. Returning an error makes the cache treat the request as a miss.
pub trait KeyDigest: Send + Sync {
    /// Derive the key for `(a, b, tag)`.
    fn derive(&self, a: &str, b: &str, tag: i32) -> CacheResult<CacheKey>;
}

/// Builds the canonical byte sequence for a key tuple.
///
/// Layout: `<len(a)>:<a><len(b)>:<b><tag>`.
#[must_use]
pub fn canonical_bytes(a: &str, b: &str, tag: i32) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len() + 32);
    for part in [a, b] {
        out.extend_from_slice(part.len().to_string().as_bytes());
        out.push(b':');
        out.extend_from_slice(part.as_bytes());
    }
    out.extend_from_slice(tag.to_string().as_bytes());
    out
}

/// SHA-256 key digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl KeyDigest for Sha256Digest {
    fn derive(&self, a: &str, b: &str, tag: i32) -> CacheResult<CacheKey> {
        let mut hasher = Sha256::new();
        hasher.update(canonical_bytes(a, b, tag));
        Ok(CacheKey(hex::encode_upper(hasher.finalize())))
    }
}
