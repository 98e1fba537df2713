//! User registration and listing on top of the users repository.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::info;

use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::errors::domain::{DomainError, InfraErrorKind, ValidationKind};
use crate::logging::pii::Redacted;
use crate::repos::users::{self as users_repo, User};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Input to [`register_user`].
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Public view of a user row; never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

fn validate(new_user: &NewUser) -> Result<(), DomainError> {
    let email = new_user.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation(
            ValidationKind::InvalidEmail,
            "A valid e-mail address is required",
        ));
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            ValidationKind::WeakPassword,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validate, hash (on the blocking pool) and insert a new user.
pub async fn register_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    new_user: NewUser,
) -> Result<UserSummary, DomainError> {
    validate(&new_user)?;

    let NewUser {
        email,
        password,
        role,
    } = new_user;

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DomainError::infra(InfraErrorKind::Other("Join".into()), e.to_string()))?
        .map_err(|e| DomainError::infra(InfraErrorKind::Other("Hash".into()), e.to_string()))?;

    let user = users_repo::create_user(conn, &email, password_hash, role).await?;
    info!(user_id = user.id, email = %Redacted(&user.email), role = %user.role, "user registered");

    Ok(user.into())
}

pub async fn list_users<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<UserSummary>, DomainError> {
    Ok(users_repo::list_users(conn)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect())
}
