//! User repository functions for domain layer (generic over ConnectionTrait).

use sea_orm::ConnectionTrait;

use crate::adapters::users_sea as users_adapter;
use crate::auth::Role;
use crate::errors::domain::{DomainError, InfraErrorKind};

/// User domain model
#[derive(Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: time::OffsetDateTime,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// E-mails are stored and looked up trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<User>, DomainError> {
    let user = users_adapter::find_by_email(conn, &normalize_email(email)).await?;
    user.map(User::try_from).transpose()
}

pub async fn create_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
    password_hash: String,
    role: Role,
) -> Result<User, DomainError> {
    let dto = users_adapter::UserCreate::new(normalize_email(email), password_hash)
        .with_role(role.as_str());
    let user = users_adapter::create_user(conn, dto).await?;
    User::try_from(user)
}

pub async fn list_users<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<User>, DomainError> {
    users_adapter::list_users(conn)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

impl TryFrom<crate::entities::users::Model> for User {
    type Error = DomainError;

    fn try_from(model: crate::entities::users::Model) -> Result<Self, Self::Error> {
        let role = model.role.parse::<Role>().map_err(|e| {
            tracing::error!(user_id = model.user_id, error = %e, "users.role holds an unknown value");
            DomainError::infra(
                InfraErrorKind::DataCorruption,
                format!("user {} has an unknown role", model.user_id),
            )
        })?;

        Ok(Self {
            id: model.user_id,
            email: model.email,
            password_hash: model.password_hash,
            role,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use time::macros::datetime;

    use super::{find_by_email, list_users, normalize_email};
    use crate::auth::Role;
    use crate::entities::users;
    use crate::errors::domain::{DomainError, InfraErrorKind};

    fn row(id: i64, email: &str, role: &str) -> users::Model {
        users::Model {
            user_id: id,
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: role.to_string(),
            created_at: datetime!(2025-09-01 12:00 UTC),
        }
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }

    #[tokio::test]
    async fn find_by_email_maps_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(7, "a@b.com", "admin")]])
            .into_connection();

        let user = find_by_email(&db, "A@b.com").await.unwrap().unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn find_by_email_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        assert!(find_by_email(&db, "nobody@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_role_is_data_corruption() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, "ok@b.com", "user"), row(2, "bad@b.com", "root")]])
            .into_connection();

        let err = list_users(&db).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Infra(InfraErrorKind::DataCorruption, _)
        ));
    }
}
