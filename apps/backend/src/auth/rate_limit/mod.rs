//! Fixed-window login attempt limiter.
//!
//! Every attempt increments the counter for `(key, window_start)`; an attempt
//! whose post-increment count exceeds the limit is rejected and the increment
//! stands. The counter backend does the increment atomically, so workers never
//! lock anything in-process.

mod memory;
mod redis_counter;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::InMemoryCounter;
pub use self::redis_counter::RedisCounter;

const KEY_PREFIX: &str = "login_attempts";
/// Counter namespace for per-client-address budgets.
pub const CLIENT_KEY_PREFIX: &str = "login_attempts_client";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CounterError {
    #[error("counter backend unavailable: {0}")]
    Unavailable(String),
    #[error("counter backend error: {0}")]
    Backend(String),
    #[error("system clock is before the unix epoch")]
    Clock,
}

/// Shared counter storage.
#[async_trait]
pub trait AttemptCounter: Send + Sync {
    /// Atomically increment `key` and return the post-increment count. The
    /// key lives at least `window` after its first increment.
    async fn increment_and_get(&self, key: &str, window: Duration) -> Result<u64, CounterError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Attempts allowed per window
    pub limit: u64,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { count: u64, remaining: u64 },
    Rejected { count: u64, retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }

    pub fn count(&self) -> u64 {
        match self {
            Admission::Allowed { count, .. } | Admission::Rejected { count, .. } => *count,
        }
    }
}

/// Rate-limit keys are case- and whitespace-insensitive so `A@b.com ` and
/// `a@b.com` share one budget.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

#[derive(Clone)]
pub struct LoginRateLimiter {
    counter: Arc<dyn AttemptCounter>,
    config: RateLimitConfig,
    prefix: &'static str,
}

impl LoginRateLimiter {
    pub fn new(counter: Arc<dyn AttemptCounter>, config: RateLimitConfig) -> Self {
        Self {
            counter,
            config,
            prefix: KEY_PREFIX,
        }
    }

    /// Count under a different key namespace, so limiters sharing one
    /// counter never share buckets.
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    fn window_secs(&self) -> u64 {
        self.config.window.as_secs().max(1)
    }

    fn window_start(&self, now: SystemTime) -> Result<(u64, u64), CounterError> {
        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .map_err(|_| CounterError::Clock)?
            .as_secs();
        Ok((now_secs, now_secs - now_secs % self.window_secs()))
    }

    /// Counter key of the bucket `key` falls into at `now`.
    pub fn bucket_key(&self, key: &str, now: SystemTime) -> Result<String, CounterError> {
        let (_, window_start) = self.window_start(now)?;
        Ok(format!("{}:{}:{window_start}", self.prefix, normalize_key(key)))
    }

    pub async fn admit(&self, key: &str) -> Result<Admission, CounterError> {
        self.admit_at(key, SystemTime::now()).await
    }

    pub async fn admit_at(&self, key: &str, now: SystemTime) -> Result<Admission, CounterError> {
        let (now_secs, window_start) = self.window_start(now)?;
        let bucket = format!("{}:{}:{window_start}", self.prefix, normalize_key(key));

        let count = self
            .counter
            .increment_and_get(&bucket, Duration::from_secs(self.window_secs()))
            .await?;

        if count > self.config.limit {
            let window_end = window_start + self.window_secs();
            Ok(Admission::Rejected {
                count,
                retry_after: Duration::from_secs(window_end - now_secs),
            })
        } else {
            Ok(Admission::Allowed {
                count,
                remaining: self.config.limit - count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use proptest::prelude::*;

    use super::{
        normalize_key, Admission, InMemoryCounter, LoginRateLimiter, RateLimitConfig,
        CLIENT_KEY_PREFIX,
    };

    fn limiter(limit: u64) -> (Arc<InMemoryCounter>, LoginRateLimiter) {
        let counter = Arc::new(InMemoryCounter::new());
        let limiter = LoginRateLimiter::new(
            counter.clone(),
            RateLimitConfig {
                limit,
                window: Duration::from_secs(60),
            },
        );
        (counter, limiter)
    }

    // Start of a minute so +59s stays in the same window.
    fn minute_start() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_750_000_020)
    }

    #[tokio::test]
    async fn eleventh_attempt_is_rejected() {
        let (_, limiter) = limiter(10);
        let now = minute_start();

        for attempt in 1..=10u64 {
            let admission = limiter.admit_at("a@b.com", now).await.unwrap();
            assert_eq!(
                admission,
                Admission::Allowed {
                    count: attempt,
                    remaining: 10 - attempt
                }
            );
        }

        let eleventh = limiter
            .admit_at("a@b.com", now + Duration::from_secs(15))
            .await
            .unwrap();
        assert_eq!(
            eleventh,
            Admission::Rejected {
                count: 11,
                retry_after: Duration::from_secs(45)
            }
        );
    }

    #[tokio::test]
    async fn rejected_attempts_still_count() {
        let (counter, limiter) = limiter(2);
        let now = minute_start();
        for _ in 0..5 {
            limiter.admit_at("a@b.com", now).await.unwrap();
        }
        let bucket = limiter.bucket_key("a@b.com", now).unwrap();
        assert_eq!(counter.count(&bucket), 5);
    }

    #[tokio::test]
    async fn next_window_starts_from_zero() {
        let (_, limiter) = limiter(1);
        let now = minute_start();

        assert!(limiter.admit_at("a@b.com", now).await.unwrap().is_allowed());
        assert!(!limiter.admit_at("a@b.com", now).await.unwrap().is_allowed());

        let next = now + Duration::from_secs(60);
        let admission = limiter.admit_at("a@b.com", next).await.unwrap();
        assert_eq!(admission, Admission::Allowed { count: 1, remaining: 0 });
    }

    #[tokio::test]
    async fn keys_are_normalized_and_isolated() {
        let (_, limiter) = limiter(1);
        let now = minute_start();

        assert!(limiter.admit_at("A@B.com ", now).await.unwrap().is_allowed());
        assert!(!limiter.admit_at("a@b.com", now).await.unwrap().is_allowed());
        assert!(limiter.admit_at("c@d.com", now).await.unwrap().is_allowed());
    }

    #[test]
    fn bucket_key_names_window_start() {
        let (_, limiter) = limiter(10);
        let now = minute_start() + Duration::from_secs(42);
        assert_eq!(
            limiter.bucket_key(" Alice@Example.com", now).unwrap(),
            "login_attempts:alice@example.com:1750000020"
        );
    }

    #[tokio::test]
    async fn prefixed_limiters_share_a_counter_but_not_buckets() {
        let (counter, by_user) = limiter(1);
        let by_client = by_user.clone().with_prefix(CLIENT_KEY_PREFIX);
        let now = minute_start();

        assert!(by_user.admit_at("10.0.0.1", now).await.unwrap().is_allowed());
        assert!(by_client.admit_at("10.0.0.1", now).await.unwrap().is_allowed());

        let client_bucket = by_client.bucket_key("10.0.0.1", now).unwrap();
        assert!(client_bucket.starts_with("login_attempts_client:10.0.0.1:"));
        assert_eq!(counter.count(&client_bucket), 1);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_key("  MiXeD@Case.ORG\t"), "mixed@case.org");
    }

    #[tokio::test]
    async fn concurrent_attempts_are_all_counted() {
        let (counter, limiter) = limiter(10);
        let now = minute_start();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.admit_at("a@b.com", now).await.unwrap() })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().is_allowed() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 10);
        assert_eq!(counter.count(&limiter.bucket_key("a@b.com", now).unwrap()), 50);
    }

    proptest! {
        #[test]
        fn admits_exactly_limit_per_window(limit in 1u64..20, attempts in 1u64..40) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (counter, limiter) = limiter(limit);
            let now = minute_start();

            let allowed = rt.block_on(async {
                let mut allowed = 0u64;
                for _ in 0..attempts {
                    if limiter.admit_at("p@q.com", now).await.unwrap().is_allowed() {
                        allowed += 1;
                    }
                }
                allowed
            });

            prop_assert_eq!(allowed, attempts.min(limit));
            prop_assert_eq!(counter.count(&limiter.bucket_key("p@q.com", now).unwrap()), attempts);
        }
    }
}
