//! Single-entry TTL cache shared by the price and gas oracles.
//!
//! Holds one `(value, fetched_at)` pair behind an async RwLock. Readers may see
//! a stale value; writers simply overwrite (last writer wins).

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Fresh while strictly younger than `ttl`
    pub fn is_fresh_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Value if it is still within the TTL at `now`
    pub async fn fresh_at(&self, now: Instant) -> Option<T> {
        let guard = self.entry.read().await;
        guard
            .as_ref()
            .filter(|entry| entry.is_fresh_at(now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Last stored value regardless of age
    pub async fn latest(&self) -> Option<CacheEntry<T>> {
        self.entry.read().await.clone()
    }

    pub async fn store_at(&self, value: T, now: Instant) {
        let mut guard = self.entry.write().await;
        *guard = Some(CacheEntry {
            value,
            fetched_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_until_ttl_elapses() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.store_at(3500.0_f64, t0).await;

        assert_eq!(cache.fresh_at(t0).await, Some(3500.0));
        assert_eq!(cache.fresh_at(t0 + Duration::from_secs(299)).await, Some(3500.0));
        assert_eq!(cache.fresh_at(t0 + Duration::from_secs(300)).await, None);

        // Stale value is still reachable
        let latest = cache.latest().await.unwrap();
        assert_eq!(latest.value, 3500.0);
    }

    #[test]
    fn test_overwrite_resets_age() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();

        tokio_test::block_on(async {
            cache.store_at("old", t0).await;
            cache.store_at("new", t0 + Duration::from_secs(50)).await;

            assert_eq!(cache.fresh_at(t0 + Duration::from_secs(100)).await, Some("new"));
            assert_eq!(cache.latest().await.unwrap().fetched_at, t0 + Duration::from_secs(50));
        });
    }

    #[tokio::test]
    async fn test_empty_cache() {
        let cache: TtlCache<u64> = TtlCache::new(Duration::from_secs(10));
        assert!(cache.latest().await.is_none());
        assert!(cache.fresh_at(Instant::now()).await.is_none());
    }
}
