//! Domain-level error type used across services, repositories and adapters.
//!
//! This error type is HTTP-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Domain-level validation failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    InvalidEmail,
    WeakPassword,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    User,
    Other(String),
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    UniqueEmail,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input validation or business rule violation
    Validation(ValidationKind, String),
    /// Semantic conflict
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation error {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }
}

/// Message of a unique-constraint violation, if `e` is one. Falls back to the
/// Postgres error text when the driver error is not structured (mock
/// connections, proxied errors).
fn unique_violation(e: &sea_orm::DbErr) -> Option<String> {
    if let Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) = e.sql_err() {
        return Some(msg);
    }
    let text = e.to_string();
    text.contains("duplicate key value violates unique constraint")
        .then_some(text)
}

/// Translate a `DbErr` into a `DomainError`.
///
/// Connection-level failures become `DbUnavailable`; a unique violation on
/// `users.email` becomes a `UniqueEmail` conflict. Raw driver messages are
/// logged, never returned.
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        use sea_orm::DbErr;

        if let Some(msg) = unique_violation(&e) {
            if msg.contains("email") {
                return DomainError::conflict(ConflictKind::UniqueEmail, "Email already registered");
            }
            return DomainError::conflict(ConflictKind::Other("Unique".into()), "Duplicate record");
        }

        match &e {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                tracing::error!(error = %e, "database unavailable");
                DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable")
            }
            DbErr::RecordNotFound(_) => {
                DomainError::not_found(NotFoundKind::Other("Record".into()), "Record not found")
            }
            _ => {
                tracing::error!(error = %e, "database error");
                DomainError::infra(InfraErrorKind::Other("Db".into()), "Database error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_maps_to_unique_email_conflict() {
        let err: DomainError = sea_orm::DbErr::Query(sea_orm::RuntimeErr::Internal(
            "duplicate key value violates unique constraint \"idx_users_email_unique\"".into(),
        ))
        .into();
        assert!(matches!(
            err,
            DomainError::Conflict(ConflictKind::UniqueEmail, _)
        ));
    }

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: DomainError = sea_orm::DbErr::RecordNotFound("users".into()).into();
        assert!(matches!(err, DomainError::NotFound(_, _)));
    }

    #[test]
    fn other_db_errors_map_to_infra_without_leaking_detail() {
        let err: DomainError = sea_orm::DbErr::Custom("secret driver text".into()).into();
        match err {
            DomainError::Infra(_, detail) => assert!(!detail.contains("secret")),
            other => panic!("expected infra error, got {other:?}"),
        }
    }
}
