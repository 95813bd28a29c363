//! Error types for the decision cache.
//!
//! Cache operations themselves never fail: a problem while deriving a key is
//! reported through these types only at the [`KeyDigest`](crate::digest::KeyDigest)
//! seam and while loading configuration. The cache maps every error to
//! "no cached answer".

/// Errors that can occur while deriving keys or building a cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The digest primitive failed or is unavailable.
    #[error("Digest error: {message}")]
    Digest {
        /// Description of the digest failure.
        message: String,
    },

    /// The cache configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl CacheError {
    /// Creates a new `Digest` error.
    #[must_use]
    pub fn digest(message: impl Into<String>) -> Self {
        Self::Digest {
            message: message.into(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_error_display() {
        let err = CacheError::digest("sha256 unavailable");
        assert!(matches!(err, CacheError::Digest { .. }));
        assert_eq!(err.to_string(), "Digest error: sha256 unavailable");
    }

    #[test]
    fn test_config_error_converts() {
        let err: CacheError = ConfigError::InvalidValue("cacheseconds".to_string()).into();
        assert!(matches!(err, CacheError::Configuration(_)));
        assert!(err.to_string().contains("cacheseconds"));
    }
}
