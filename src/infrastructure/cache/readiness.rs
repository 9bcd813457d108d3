//! Short-lived cache of per-team instance readiness, backed by moka

use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;

use crate::domain::TeamName;

/// Configuration for the readiness cache
#[derive(Debug, Clone)]
pub struct ReadinessCacheConfig {
    /// Maximum number of teams tracked at once
    pub max_capacity: u64,
    /// How long a readiness observation stays valid
    pub ttl: Duration,
}

impl Default for ReadinessCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(5),
        }
    }
}

impl ReadinessCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct ReadinessEntry {
    ready: bool,
    expires_at: Instant,
}

/// Maps a team to its last known readiness.
///
/// Safe to share between request handlers. Concurrent misses for the same team
/// may both query the cluster and both write back; the last write wins.
#[derive(Debug)]
pub struct InstanceReadinessCache {
    cache: MokaCache<TeamName, ReadinessEntry>,
    config: ReadinessCacheConfig,
}

impl InstanceReadinessCache {
    pub fn new() -> Self {
        Self::with_config(ReadinessCacheConfig::default())
    }

    pub fn with_config(config: ReadinessCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();

        Self { cache, config }
    }

    /// Last known readiness, or `None` when absent or expired
    pub async fn get(&self, team: &TeamName) -> Option<bool> {
        let entry = self.cache.get(team).await?;

        if Instant::now() >= entry.expires_at {
            return None;
        }

        Some(entry.ready)
    }

    /// Record readiness for the configured TTL, starting now
    pub async fn put(&self, team: &TeamName, ready: bool) {
        let entry = ReadinessEntry {
            ready,
            expires_at: Instant::now() + self.config.ttl,
        };

        self.cache.insert(team.clone(), entry).await;
    }

    /// Drop a single team's entry
    pub async fn invalidate(&self, team: &TeamName) {
        self.cache.invalidate(team).await;
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl Default for InstanceReadinessCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn team(name: &str) -> TeamName {
        TeamName::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = InstanceReadinessCache::new();

        cache.put(&team("foobar"), true).await;
        cache.put(&team("restarting"), false).await;

        assert_eq!(cache.get(&team("foobar")).await, Some(true));
        assert_eq!(cache.get(&team("restarting")).await, Some(false));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InstanceReadinessCache::new();
        assert_eq!(cache.get(&team("missing")).await, None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = InstanceReadinessCache::with_config(
            ReadinessCacheConfig::default().with_ttl(Duration::from_millis(50)),
        );

        cache.put(&team("foobar"), true).await;
        assert_eq!(cache.get(&team("foobar")).await, Some(true));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get(&team("foobar")).await, None);
    }

    #[tokio::test]
    async fn test_expired_read_leaves_entry_to_moka() {
        let cache = InstanceReadinessCache::new();
        let expired = ReadinessEntry {
            ready: true,
            expires_at: Instant::now(),
        };
        cache.cache.insert(team("foobar"), expired).await;

        assert_eq!(cache.get(&team("foobar")).await, None);
        assert!(cache.cache.get(&team("foobar")).await.is_some());

        cache.put(&team("foobar"), false).await;
        assert_eq!(cache.get(&team("foobar")).await, Some(false));
    }

    #[tokio::test]
    async fn test_max_capacity_is_applied() {
        let cache = InstanceReadinessCache::with_config(
            ReadinessCacheConfig::default().with_max_capacity(2),
        );

        for name in ["team-a", "team-b", "team-c", "team-d"] {
            cache.put(&team(name), true).await;
        }
        cache.cache.run_pending_tasks().await;

        assert!(cache.cache.entry_count() <= 2);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = InstanceReadinessCache::new();

        cache.put(&team("foobar"), true).await;
        cache.put(&team("foobar"), false).await;

        assert_eq!(cache.get(&team("foobar")).await, Some(false));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = InstanceReadinessCache::new();

        cache.put(&team("foobar"), true).await;
        cache.put(&team("other"), true).await;
        cache.invalidate(&team("foobar")).await;

        assert_eq!(cache.get(&team("foobar")).await, None);
        assert_eq!(cache.get(&team("other")).await, Some(true));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InstanceReadinessCache::new();

        cache.put(&team("team-a"), true).await;
        cache.put(&team("team-b"), false).await;
        cache.clear().await;

        assert_eq!(cache.get(&team("team-a")).await, None);
        assert_eq!(cache.get(&team("team-b")).await, None);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let cache = Arc::new(InstanceReadinessCache::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache.put(&team("foobar"), i % 2 == 0).await;
                    cache.get(&team("foobar")).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
    }
}
