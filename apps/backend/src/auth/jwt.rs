use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Role;
use crate::state::security_config::SecurityConfig;

/// Claims carried by backend-issued access tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the account (its e-mail)
    pub sub: String,
    pub role: Role,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token algorithm does not match configuration")]
    AlgorithmMismatch,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("failed to encode token: {0}")]
    Encoding(String),
    #[error("system clock is before the unix epoch")]
    Clock,
}

fn unix_seconds(t: SystemTime) -> Result<i64, TokenError> {
    let secs = t
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Clock)?
        .as_secs();
    i64::try_from(secs).map_err(|_| TokenError::Clock)
}

/// Mint a signed access token for `sub` valid from `now` for `ttl`.
pub fn mint_access_token(
    sub: &str,
    role: Role,
    ttl: Duration,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, TokenError> {
    let iat = unix_seconds(now)?;
    let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::Clock)?;
    let exp = iat.saturating_add(ttl_secs);

    let claims = Claims {
        sub: sub.to_string(),
        role,
        iat,
        exp,
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verify signature, algorithm and expiry of `token` as seen at `now`.
///
/// Expiry is checked here rather than by the decoder so it uses the injected
/// clock with zero leeway: a token is dead once `now >= exp`.
pub fn verify_access_token(
    token: &str,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(security.algorithm);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(e.to_string()),
    })?;

    if unix_seconds(now)? >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
