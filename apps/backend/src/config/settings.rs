//! Process configuration, read once at startup.

use std::env;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::auth::rate_limit::RateLimitConfig;
use crate::config::db::{db_url_from, DbProfile};
use crate::error::AppError;
use crate::state::security_config::SecurityConfig;

const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct Settings {
    pub project_name: String,
    pub api_v1_prefix: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub security: SecurityConfig,
    pub login_rate_limit: RateLimitConfig,
    /// Per-client-address budget across all usernames; `None` when disabled.
    pub login_client_rate_limit: Option<RateLimitConfig>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("project_name", &self.project_name)
            .field("api_v1_prefix", &self.api_v1_prefix)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("redis", &self.redis_url.is_some())
            .field("cors_origins", &self.cors_origins)
            .field("security", &self.security)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("login_client_rate_limit", &self.login_client_rate_limit)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = var("SECRET_KEY")
            .ok_or_else(|| AppError::config("Required environment variable 'SECRET_KEY' is not set"))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::config(format!(
                "SECRET_KEY must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let algorithm = match var("ALGORITHM").as_deref() {
            None | Some("HS256") => Algorithm::HS256,
            Some("HS384") => Algorithm::HS384,
            Some("HS512") => Algorithm::HS512,
            Some(other) => {
                return Err(AppError::config(format!(
                    "ALGORITHM must be one of HS256, HS384, HS512, got '{other}'"
                )))
            }
        };

        let ttl_minutes: u64 = parse_or(&var, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        let security = SecurityConfig::new(secret.into_bytes())
            .with_algorithm(algorithm)
            .with_access_token_ttl(Duration::from_secs(ttl_minutes.saturating_mul(60)));

        let limit: u64 = parse_or(&var, "LOGIN_RATE_LIMIT", 10)?;
        let window_secs: u64 = parse_or(&var, "LOGIN_RATE_WINDOW_SECS", 60)?;
        if limit == 0 || window_secs == 0 {
            return Err(AppError::config(
                "LOGIN_RATE_LIMIT and LOGIN_RATE_WINDOW_SECS must be positive",
            ));
        }

        // 0 turns the per-client budget off
        let client_limit: u64 = parse_or(&var, "LOGIN_CLIENT_RATE_LIMIT", 100)?;
        let login_client_rate_limit = (client_limit > 0).then(|| RateLimitConfig {
            limit: client_limit,
            window: Duration::from_secs(window_secs),
        });

        let cors_origins = var("BACKEND_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let api_v1_prefix = var("API_V1_STR").unwrap_or_else(|| "/api/v1".to_string());
        if !api_v1_prefix.starts_with('/') {
            return Err(AppError::config("API_V1_STR must start with '/'"));
        }

        Ok(Self {
            project_name: var("PROJECT_NAME").unwrap_or_else(|| "Profile Doctor".to_string()),
            api_v1_prefix: api_v1_prefix.trim_end_matches('/').to_string(),
            host: var("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "BACKEND_PORT", 8000)?,
            database_url: db_url_from(DbProfile::Prod, &var)?,
            redis_url: var("REDIS_URL"),
            cors_origins,
            security,
            login_rate_limit: RateLimitConfig {
                limit,
                window: Duration::from_secs(window_secs),
            },
            login_client_rate_limit,
        })
    }
}

fn parse_or<T, F>(var: &F, name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value '{raw}'"))),
    }
}
