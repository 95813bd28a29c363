//! Periodic background sweep.
//!
//! The write path already prunes on every `record`, but a plugin that stops
//! receiving new requests would otherwise hold its last batch of entries
//! forever. This task sweeps both caches on a fixed interval.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::AuthCaches;
use crate::config::CacheConfig;

impl<D> AuthCaches<D>
where
    D: Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Start the background cleanup task.
    ///
    /// Must be called from within a tokio runtime. Abort the returned handle
    /// to stop sweeping. A zero interval starts nothing and returns `None`.
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            tracing::warn!("Decision cache cleanup interval is zero, not starting task");
            return None;
        }

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let removed = self.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "Decision cache cleanup completed");
                }
            }
        }))
    }

    /// Start the cleanup task if `config` asks for one.
    pub fn start_configured_cleanup(
        self: Arc<Self>,
        config: &CacheConfig,
    ) -> Option<JoinHandle<()>> {
        match config.cleanup_interval {
            Some(interval) if config.is_enabled() => {
                tracing::info!(?interval, "Starting decision cache cleanup task");
                self.start_cleanup_task(interval)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::decision::{AccessMode, Decision};
    use crate::digest::Sha256Digest;

    fn manual_caches(ttl_seconds: i64) -> (Arc<AuthCaches>, ManualClock) {
        let clock = ManualClock::new();
        let caches = AuthCaches::with_parts(
            ttl_seconds,
            Arc::new(clock.clone()),
            Arc::new(Sha256Digest),
        );
        (Arc::new(caches), clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps_both_caches() {
        let (caches, clock) = manual_caches(1);
        caches.record_authorization("alice", "t", AccessMode::Read, Decision::Allow);
        caches.record_authentication("alice", "pw", Decision::Allow);

        let handle = Arc::clone(&caches)
            .start_cleanup_task(Duration::from_secs(5))
            .unwrap();

        clock.advance(Duration::from_secs(2));
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(caches.authorization().is_empty());
        assert!(caches.authentication().is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_keeps_fresh_entries() {
        let (caches, _clock) = manual_caches(60);
        caches.record_authorization("alice", "t", AccessMode::Read, Decision::Allow);

        let handle = Arc::clone(&caches)
            .start_cleanup_task(Duration::from_secs(1))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(caches.authorization().len(), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_interval_starts_no_task() {
        let caches: Arc<AuthCaches> = Arc::new(AuthCaches::new(60));
        caches.record_authorization("alice", "t", AccessMode::Read, Decision::Allow);

        assert!(Arc::clone(&caches).start_cleanup_task(Duration::ZERO).is_none());

        let zero = CacheConfig {
            cache_seconds: 60,
            cleanup_interval: Some(Duration::ZERO),
        };
        assert!(Arc::clone(&caches).start_configured_cleanup(&zero).is_none());
        assert_eq!(caches.authorization().len(), 1);
    }

    #[tokio::test]
    async fn test_configured_cleanup_requires_interval() {
        let caches: Arc<AuthCaches> = Arc::new(AuthCaches::new(60));
        assert!(
            Arc::clone(&caches)
                .start_configured_cleanup(&CacheConfig::with_ttl_seconds(60))
                .is_none()
        );

        let disabled = CacheConfig {
            cache_seconds: 0,
            cleanup_interval: Some(Duration::from_secs(1)),
        };
        assert!(Arc::clone(&caches).start_configured_cleanup(&disabled).is_none());

        let enabled = CacheConfig {
            cache_seconds: 60,
            cleanup_interval: Some(Duration::from_secs(1)),
        };
        let handle = caches.start_configured_cleanup(&enabled).unwrap();
        handle.abort();
    }
}
