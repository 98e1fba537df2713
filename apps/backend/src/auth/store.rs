//! Credential lookup used by the authentication flow.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::DatabaseConnection;

use crate::auth::{IdentityRecord, Role};
use crate::errors::domain::DomainError;
use crate::repos::users::{self as users_repo, normalize_email};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the identity stored under `identifier` (an e-mail).
    async fn find_by_identifier(&self, identifier: &str)
        -> Result<Option<IdentityRecord>, DomainError>;
}

/// Credential store backed by the `users` table. Shares the connection
/// handle with [`AppState`](crate::state::app_state::AppState).
#[derive(Clone)]
pub struct SeaOrmCredentialStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCredentialStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SeaOrmCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<IdentityRecord>, DomainError> {
        let user = users_repo::find_by_email(&*self.db, identifier).await?;
        Ok(user.map(|u| IdentityRecord {
            identifier: u.email,
            password_hash: u.password_hash,
            role: u.role,
        }))
    }
}

/// Process-local store, keyed by normalized e-mail.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<String, IdentityRecord>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identifier: &str, password_hash: impl Into<String>, role: Role) {
        let identifier = normalize_email(identifier);
        self.records.insert(
            identifier.clone(),
            IdentityRecord {
                identifier,
                password_hash: password_hash.into(),
                role,
            },
        );
    }

    pub fn with_user(self, identifier: &str, password_hash: impl Into<String>, role: Role) -> Self {
        self.insert(identifier, password_hash, role);
        self
    }

    pub fn remove(&self, identifier: &str) -> bool {
        self.records.remove(&normalize_email(identifier)).is_some()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<IdentityRecord>, DomainError> {
        Ok(self
            .records
            .get(&normalize_email(identifier))
            .map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, RuntimeErr};
    use time::macros::datetime;

    use super::{CredentialStore, InMemoryCredentialStore, SeaOrmCredentialStore};
    use crate::auth::Role;
    use crate::entities::users;
    use crate::errors::domain::DomainError;

    #[tokio::test]
    async fn in_memory_lookup_is_case_insensitive() {
        let store = InMemoryCredentialStore::new().with_user("A@B.com", "hash", Role::User);

        let rec = store.find_by_identifier(" a@b.COM").await.unwrap().unwrap();
        assert_eq!(rec.identifier, "a@b.com");
        assert_eq!(rec.role, Role::User);

        assert!(store.remove("a@b.com"));
        assert!(store.find_by_identifier("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sea_orm_store_maps_rows_to_records() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![users::Model {
                user_id: 1,
                email: "a@b.com".into(),
                password_hash: "$argon2id$stored".into(),
                role: "admin".into(),
                created_at: datetime!(2025-09-01 0:00 UTC),
            }]])
            .into_connection();

        let store = SeaOrmCredentialStore::new(Arc::new(db));
        let rec = store.find_by_identifier("a@b.com").await.unwrap().unwrap();
        assert_eq!(rec.identifier, "a@b.com");
        assert_eq!(rec.password_hash, "$argon2id$stored");
        assert_eq!(rec.role, Role::Admin);
    }

    #[tokio::test]
    async fn sea_orm_store_surfaces_db_failures() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Conn(RuntimeErr::Internal("connection refused".into()))])
            .into_connection();

        let store = SeaOrmCredentialStore::new(Arc::new(db));
        let err = store.find_by_identifier("a@b.com").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Infra(crate::errors::domain::InfraErrorKind::DbUnavailable, _)
        ));
    }
}
