use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::auth::rate_limit::{
    AttemptCounter, InMemoryCounter, LoginRateLimiter, RateLimitConfig, RedisCounter,
    CLIENT_KEY_PREFIX,
};
use crate::auth::{Authenticator, CredentialStore, InMemoryCredentialStore, SeaOrmCredentialStore};
use crate::config::Settings;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

const COUNTER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    security: SecurityConfig,
    rate_limit: RateLimitConfig,
    client_rate_limit: Option<RateLimitConfig>,
    project_name: String,
    database_url: Option<String>,
    redis_url: Option<String>,
    db: Option<DatabaseConnection>,
    store: Option<Arc<dyn CredentialStore>>,
    counter: Option<Arc<dyn AttemptCounter>>,
}

impl StateBuilder {
    pub fn new(security: SecurityConfig) -> Self {
        Self {
            security,
            rate_limit: RateLimitConfig::default(),
            client_rate_limit: None,
            project_name: "Profile Doctor".to_string(),
            database_url: None,
            redis_url: None,
            db: None,
            store: None,
            counter: None,
        }
    }

    /// Everything the running server needs: database, optional Redis, limits.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builder = Self::new(settings.security.clone())
            .with_rate_limit(settings.login_rate_limit)
            .with_client_rate_limit(settings.login_client_rate_limit)
            .with_project_name(settings.project_name.clone());
        builder.database_url = Some(settings.database_url.clone());
        builder.redis_url = settings.redis_url.clone();
        builder
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_client_rate_limit(mut self, rate_limit: Option<RateLimitConfig>) -> Self {
        self.client_rate_limit = rate_limit;
        self
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_db(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_counter(mut self, counter: Arc<dyn AttemptCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let db = match (self.db, &self.database_url) {
            (Some(db), _) => Some(Arc::new(db)),
            // single entrypoint: connect + migrate
            (None, Some(url)) => Some(Arc::new(bootstrap_db(url).await?)),
            (None, None) => None,
        };

        let store: Arc<dyn CredentialStore> = match (self.store, &db) {
            (Some(store), _) => store,
            (None, Some(db)) => Arc::new(SeaOrmCredentialStore::new(Arc::clone(db))),
            (None, None) => {
                warn!("no database configured; credential store is empty and in-memory");
                Arc::new(InMemoryCredentialStore::new())
            }
        };

        let counter: Arc<dyn AttemptCounter> = match (self.counter, &self.redis_url) {
            (Some(counter), _) => counter,
            (None, Some(url)) => Arc::new(RedisCounter::connect(url).await.map_err(|e| {
                AppError::config(format!("cannot connect login attempt counter: {e}"))
            })?),
            (None, None) => {
                warn!("REDIS_URL not set; login attempts are counted per process only");
                let counter = Arc::new(InMemoryCounter::new());
                spawn_counter_sweeper(counter.clone());
                counter
            }
        };

        let limiter = LoginRateLimiter::new(Arc::clone(&counter), self.rate_limit);
        let mut authenticator = Authenticator::new(store, limiter, self.security)?;
        if let Some(client_rate_limit) = self.client_rate_limit {
            authenticator = authenticator.with_client_limiter(
                LoginRateLimiter::new(counter, client_rate_limit).with_prefix(CLIENT_KEY_PREFIX),
            );
        }

        info!(
            limit = self.rate_limit.limit,
            window_secs = self.rate_limit.window.as_secs(),
            client_limit = self.client_rate_limit.map(|c| c.limit),
            database = db.is_some(),
            "application state ready"
        );

        let state = match db {
            Some(db) => AppState::new(db, authenticator),
            None => AppState::without_db(authenticator),
        };
        Ok(state.with_project_name(self.project_name))
    }
}

fn spawn_counter_sweeper(counter: Arc<InMemoryCounter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(COUNTER_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = counter.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired login attempt buckets purged");
            }
        }
    });
}
