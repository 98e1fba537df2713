use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{AttemptCounter, CounterError};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u64,
    expires_at: Instant,
}

/// Process-local counter. Increments take the shard lock of one entry, so
/// unrelated keys never contend. Only correct for a single backend process.
#[derive(Debug, Default)]
pub struct InMemoryCounter {
    buckets: DashMap<String, Bucket>,
}

impl InMemoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn increment(&self, key: &str, window: Duration, now: Instant) -> u64 {
        let mut bucket = self.buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            expires_at: now + window,
        });
        if bucket.expires_at <= now {
            bucket.count = 0;
            bucket.expires_at = now + window;
        }
        bucket.count += 1;
        bucket.count
    }

    /// Current count for `key`, 0 when absent.
    pub fn count(&self, key: &str) -> u64 {
        self.buckets.get(key).map(|b| b.count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop buckets whose window has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.expires_at > now);
        before.saturating_sub(self.buckets.len())
    }
}

#[async_trait]
impl AttemptCounter for InMemoryCounter {
    async fn increment_and_get(&self, key: &str, window: Duration) -> Result<u64, CounterError> {
        Ok(self.increment(key, window, Instant::now()))
    }
}
