//! Decision cache configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [cache]
//! cache_seconds = 300
//! cleanup_interval = "1m"
//! ```
//!
//! Broker plugins usually receive their settings as flat `auth_opt_*` pairs;
//! [`CacheConfig::from_plugin_options`] reads those directly.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Plugin option keys that carry the cache lifetime.
const CACHE_SECONDS_KEYS: &[&str] = &["cacheseconds", "auth_opt_cacheseconds", "cache_seconds"];

/// Plugin option keys that carry the background sweep interval.
const CLEANUP_INTERVAL_KEYS: &[&str] = &[
    "cache_cleanup_interval",
    "auth_opt_cache_cleanup_interval",
];

/// Settings shared by the authentication and authorization caches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a recorded decision stays valid, in seconds.
    /// Zero or negative disables caching entirely.
    pub cache_seconds: i64,

    /// Interval for the optional background sweeper.
    /// `None` leaves pruning to writes and reads only.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub cleanup_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_seconds: 300,
            cleanup_interval: None,
        }
    }
}

/// Document layout accepted by [`CacheConfig::from_toml_str`].
#[derive(Deserialize)]
#[serde(untagged)]
enum TomlDocument {
    Wrapped { cache: CacheConfig },
    Bare(CacheConfig),
}

impl CacheConfig {
    /// Create a configuration with the given lifetime and no sweeper.
    #[must_use]
    pub fn with_ttl_seconds(cache_seconds: i64) -> Self {
        Self {
            cache_seconds,
            cleanup_interval: None,
        }
    }

    /// Returns `true` if decisions should be cached at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cache_seconds > 0
    }

    /// Lifetime as a duration, or `None` when caching is disabled.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        u64::try_from(self.cache_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the cleanup interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cleanup_interval == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue(
                "cleanup_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a TOML document with either a `[cache]` table or bare keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config = match toml::from_str::<TomlDocument>(input)? {
            TomlDocument::Wrapped { cache } => cache,
            TomlDocument::Bare(cache) => cache,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Build a configuration from broker plugin key/value options.
    ///
    /// Unknown keys are ignored; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a recognised key holds a value
    /// that does not parse.
    pub fn from_plugin_options<'a, I>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();

        for (key, value) in options {
            let value = value.trim();
            if CACHE_SECONDS_KEYS.contains(&key) {
                config.cache_seconds = value.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "'{key}' must be an integer number of seconds, got '{value}'"
                    ))
                })?;
            } else if CLEANUP_INTERVAL_KEYS.contains(&key) {
                let interval = humantime_serde::re::humantime::parse_duration(value)
                    .map_err(|e| ConfigError::InvalidValue(format!("'{key}': {e}")))?;
                config.cleanup_interval = Some(interval);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_seconds, 300);
        assert!(config.is_enabled());
        assert_eq!(config.ttl(), Some(Duration::from_secs(300)));
        assert!(config.cleanup_interval.is_none());
    }

    #[test]
    fn test_non_positive_seconds_disable_cache() {
        for secs in [0, -1, -300] {
            let config = CacheConfig::with_ttl_seconds(secs);
            assert!(!config.is_enabled());
            assert_eq!(config.ttl(), None);
        }
    }

    #[test]
    fn test_toml_with_cache_table() {
        let config = CacheConfig::from_toml_str(
            r#"
            [cache]
            cache_seconds = 30
            cleanup_interval = "1m"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_seconds, 30);
        assert_eq!(config.cleanup_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_toml_bare_keys() {
        let config = CacheConfig::from_toml_str("cache_seconds = 0").unwrap();
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_toml_invalid_type() {
        let err = CacheConfig::from_toml_str("cache_seconds = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_cleanup_interval_fails_validation() {
        let err = CacheConfig::from_toml_str("cleanup_interval = \"0s\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("cleanup_interval"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\ncache_seconds = 12").unwrap();

        let config = CacheConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache_seconds, 12);
    }

    #[test]
    fn test_from_missing_file() {
        let err = CacheConfig::from_file("/nonexistent/brokerguard.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_plugin_options() {
        let config = CacheConfig::from_plugin_options([
            ("backends", "mysql"),
            ("auth_opt_cacheseconds", " 45 "),
            ("cache_cleanup_interval", "10s"),
        ])
        .unwrap();
        assert_eq!(config.cache_seconds, 45);
        assert_eq!(config.cleanup_interval, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_plugin_options_defaults() {
        let config = CacheConfig::from_plugin_options([("backends", "http")]).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_plugin_options_invalid_seconds() {
        let err = CacheConfig::from_plugin_options([("cacheseconds", "five")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("cacheseconds"));
    }
}
