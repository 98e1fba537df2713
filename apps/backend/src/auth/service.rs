use std::sync::Arc;
use std::time::SystemTime;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use tracing::{debug, info};

use crate::auth::jwt::{mint_access_token, verify_access_token, TokenError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::rate_limit::{Admission, CounterError, LoginRateLimiter};
use crate::auth::store::CredentialStore;
use crate::auth::{AuthError, AuthenticatedIdentity, IssuedToken};
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::logging::pii::Redacted;
use crate::logging::security;
use crate::state::security_config::SecurityConfig;

const LOGIN_ENDPOINT: &str = "/token";

type VerifyFn = fn(&str, &str) -> bool;

/// Login and bearer-token resolution over an injected credential store.
///
/// A login request moves `RECEIVED -> RATE_CHECKED -> LOOKED_UP -> VERIFIED
/// -> TOKEN_ISSUED`, leaving early with an [`AuthError`] at any gate. Only the
/// attempt counter increment outlives a failed or cancelled request.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    limiter: LoginRateLimiter,
    client_limiter: Option<LoginRateLimiter>,
    security: SecurityConfig,
    /// Hash of a random throwaway password. Absent accounts verify against
    /// it so both failure paths run the hasher once.
    dummy_hash: Arc<str>,
    verify: VerifyFn,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        limiter: LoginRateLimiter,
        security: SecurityConfig,
    ) -> Result<Self, AuthError> {
        let throwaway = SaltString::generate(&mut OsRng);
        let dummy_hash =
            hash_password(throwaway.as_str()).map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Self {
            store,
            limiter,
            client_limiter: None,
            security,
            dummy_hash: dummy_hash.into(),
            verify: verify_password,
        })
    }

    /// Also budget attempts per client address, across all usernames.
    pub fn with_client_limiter(mut self, limiter: LoginRateLimiter) -> Self {
        self.client_limiter = Some(limiter);
        self
    }

    #[cfg(test)]
    fn with_verifier(mut self, verify: VerifyFn) -> Self {
        self.verify = verify;
        self
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }

    pub fn client_limiter(&self) -> Option<&LoginRateLimiter> {
        self.client_limiter.as_ref()
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, AuthError> {
        self.authenticate_at(username, password, SystemTime::now())
            .await
    }

    pub async fn authenticate_at(
        &self,
        username: &str,
        password: &str,
        now: SystemTime,
    ) -> Result<IssuedToken, AuthError> {
        self.authenticate_from_at(username, password, None, now)
            .await
    }

    /// Login on behalf of the client at `client_addr`. Without a client
    /// limiter or an address only the per-username budget applies.
    pub async fn authenticate_from(
        &self,
        username: &str,
        password: &str,
        client_addr: Option<&str>,
    ) -> Result<IssuedToken, AuthError> {
        self.authenticate_from_at(username, password, client_addr, SystemTime::now())
            .await
    }

    pub async fn authenticate_from_at(
        &self,
        username: &str,
        password: &str,
        client_addr: Option<&str>,
        now: SystemTime,
    ) -> Result<IssuedToken, AuthError> {
        // RECEIVED
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MalformedRequest(
                "username and password are required".to_string(),
            ));
        }

        // RATE_CHECKED: before any lookup, so a blocked caller learns nothing
        // about the account.
        let admission = self
            .limiter
            .admit_at(username, now)
            .await
            .map_err(counter_failure)?;
        if let Admission::Rejected { count, retry_after } = admission {
            security::rate_limit_hit(LOGIN_ENDPOINT, username, count);
            return Err(AuthError::TooManyAttempts { retry_after });
        }
        if let (Some(limiter), Some(addr)) = (&self.client_limiter, client_addr) {
            let admission = limiter.admit_at(addr, now).await.map_err(counter_failure)?;
            if let Admission::Rejected { count, retry_after } = admission {
                security::rate_limit_hit(LOGIN_ENDPOINT, addr, count);
                return Err(AuthError::TooManyAttempts { retry_after });
            }
        }

        // LOOKED_UP
        let record = self
            .store
            .find_by_identifier(username)
            .await
            .map_err(store_failure)?;

        // VERIFIED
        let stored_hash = match &record {
            Some(record) => record.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let candidate = password.to_string();
        let verify = self.verify;
        let matches = tokio::task::spawn_blocking(move || verify(&candidate, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))?;

        let record = match record {
            Some(record) if matches => record,
            Some(_) => {
                security::login_failed("wrong_password", username);
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                security::login_failed("unknown_user", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        // TOKEN_ISSUED
        let token = mint_access_token(
            &record.identifier,
            record.role,
            self.security.access_token_ttl,
            now,
            &self.security,
        )
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        info!(
            email = %Redacted(&record.identifier),
            role = %record.role,
            "access token issued"
        );

        Ok(IssuedToken::bearer(token))
    }

    pub async fn resolve(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        self.resolve_at(token, SystemTime::now()).await
    }

    /// Validate `token` at `now` and load the account it names. A valid token
    /// for an account that no longer exists is `Unauthenticated`.
    pub async fn resolve_at(
        &self,
        token: &str,
        now: SystemTime,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let claims = verify_access_token(token, now, &self.security).map_err(|e| {
            security::token_rejected(token_rejection_reason(&e));
            AuthError::Unauthenticated
        })?;

        let record = self
            .store
            .find_by_identifier(&claims.sub)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| {
                security::token_rejected("unknown_subject");
                AuthError::Unauthenticated
            })?;

        debug!(email = %Redacted(&record.identifier), "bearer token resolved");

        Ok(AuthenticatedIdentity {
            subject: record.identifier,
            role: record.role,
        })
    }
}

fn token_rejection_reason(err: &TokenError) -> &'static str {
    match err {
        TokenError::Expired => "expired",
        TokenError::InvalidSignature => "invalid_signature",
        TokenError::AlgorithmMismatch => "algorithm_mismatch",
        TokenError::Malformed(_) => "malformed",
        TokenError::Encoding(_) | TokenError::Clock => "internal",
    }
}

fn counter_failure(err: CounterError) -> AuthError {
    match err {
        CounterError::Unavailable(detail) | CounterError::Backend(detail) => {
            tracing::error!(error = %detail, "login attempt counter failed");
            AuthError::DependencyUnavailable("Login attempt counter unavailable".to_string())
        }
        CounterError::Clock => AuthError::Internal(err.to_string()),
    }
}

fn store_failure(err: DomainError) -> AuthError {
    match err {
        DomainError::Infra(InfraErrorKind::DbUnavailable | InfraErrorKind::Timeout, _) => {
            AuthError::DependencyUnavailable("Credential store unavailable".to_string())
        }
        other => AuthError::Internal(other.to_string()),
    }
}
