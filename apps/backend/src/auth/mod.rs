//! Authentication core: password hashing, access tokens, the login rate
//! limiter and the flow that ties them to a credential store.

pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod service;
pub mod store;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use service::Authenticator;
pub use store::{CredentialStore, InMemoryCredentialStore, SeaOrmCredentialStore};

/// Outcomes of `authenticate` and `resolve` that are not a success.
///
/// All of these are recoverable by the caller; the HTTP layer renders them
/// through `From<AuthError> for AppError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("too many login attempts, retry after {}s", .retry_after.as_secs())]
    TooManyAttempts { retry_after: Duration },
    #[error("could not validate credentials")]
    Unauthenticated,
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// What the credential store hands the authentication flow.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub identifier: String,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("identifier", &self.identifier)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Identity behind a validated bearer token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub subject: String,
    pub role: Role,
}

impl AuthenticatedIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Login response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
}

impl IssuedToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
