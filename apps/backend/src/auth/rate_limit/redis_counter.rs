use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};

use super::{AttemptCounter, CounterError};

impl From<RedisError> for CounterError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            CounterError::Unavailable(err.to_string())
        } else {
            CounterError::Backend(err.to_string())
        }
    }
}

/// Counter shared by every backend process through Redis.
#[derive(Clone)]
pub struct RedisCounter {
    conn: ConnectionManager,
}

impl RedisCounter {
    pub async fn connect(redis_url: &str) -> Result<Self, CounterError> {
        let client = Client::open(redis_url)
            .map_err(|e| CounterError::Backend(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("login attempt counter connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl AttemptCounter for RedisCounter {
    async fn increment_and_get(&self, key: &str, window: Duration) -> Result<u64, CounterError> {
        let mut conn = self.conn.clone();
        let ttl = i64::try_from(window.as_secs().max(1)).unwrap_or(i64::MAX);

        // MULTI/EXEC: the count and its expiry land together.
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, ttl)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RedisCounter;
    use crate::auth::rate_limit::{AttemptCounter, CounterError};

    #[tokio::test]
    async fn rejects_unparseable_url() {
        let err = RedisCounter::connect("not a redis url").await.err().unwrap();
        assert!(matches!(err, CounterError::Backend(_)));
    }

    // REDIS_URL=redis://localhost:6379 cargo test -- --ignored
    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn counts_and_expires_against_live_redis() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            eprintln!("REDIS_URL not set; skipping");
            return;
        };
        let counter = RedisCounter::connect(&url).await.unwrap();
        let key = format!("login_attempts:test-{}:0", uuid::Uuid::new_v4());
        let window = Duration::from_secs(60);

        for expected in 1..=3 {
            assert_eq!(counter.increment_and_get(&key, window).await.unwrap(), expected);
        }

        let mut conn = counter.conn.clone();
        let ttl: i64 = redis::cmd("TTL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!((1..=60).contains(&ttl), "ttl was {ttl}");

        let _: () = redis::cmd("DEL").arg(&key).query_async(&mut conn).await.unwrap();
    }
}
