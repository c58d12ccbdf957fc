use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::payload::Payload;

/// Internal cache entry with timestamp
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Payload,
    stored_at: Instant,
}

/// Fixed-TTL response cache keyed by canonical request signature.
///
/// Expired entries are evicted lazily on access; `purge_expired` is available
/// for callers that want a periodic sweep. Clones share the same map.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live payload for `key`, or `None` if absent or older than the TTL.
    pub fn get(&self, key: &str) -> Option<Payload> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                return Some(entry.payload.clone());
            }
            Some(_) => {}
            None => return None,
        }
        // The read guard is released above; removing under it would deadlock the shard.
        self.entries
            .remove_if(key, |_, entry| now.duration_since(entry.stored_at) >= self.ttl);
        None
    }

    /// Store (or overwrite) the payload for `key`.
    pub fn put(&self, key: impl Into<String>, payload: Payload) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestParams;

    fn text(s: &str) -> Payload {
        Payload::Text(Arc::from(s))
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_put_returns_payload() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.put("k", text("body"));
        assert_eq!(cache.get("k").unwrap().as_text().unwrap(), "body");
        assert!(cache.get("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl_and_is_evicted() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.put("k", text("body"));
        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("k").is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_refreshes_timestamp() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.put("k", text("old"));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put("k", text("new"));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k").unwrap().as_text().unwrap(), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_sweeps_only_stale_entries() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.put("a", text("1"));
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.put("b", text("2"));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parameter_order_does_not_change_key() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let first = RequestParams::new("SMA")
            .symbol("ABCD")
            .with("interval", "daily")
            .with("time_period", 50);
        let second = RequestParams::new("SMA")
            .with("time_period", 50)
            .with("interval", "daily")
            .symbol("ABCD");
        cache.put(first.cache_key(), text("sma"));
        assert!(cache.get(&second.cache_key()).is_some());
    }
}
