use std::fmt;
use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Signing configuration for access tokens. Built once at startup and shared
/// read-only through `AppState`.
#[derive(Clone)]
pub struct SecurityConfig {
    /// HMAC key used to sign and verify tokens
    pub jwt_secret: Vec<u8>,
    /// Signing algorithm (defaults to HS256)
    pub algorithm: Algorithm,
    /// Lifetime of freshly issued access tokens
    pub access_token_ttl: Duration,
}

impl SecurityConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::from_secs(30 * 60),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .finish()
    }
}
