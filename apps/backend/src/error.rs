use std::time::Duration;

use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind};
use crate::errors::ErrorCode;
use crate::trace_ctx;

/// RFC 7807 body rendered for every error response.
#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Unauthorized: {detail}")]
    Unauthorized { code: ErrorCode, detail: String },
    #[error("Too many attempts")]
    TooManyAttempts { retry_after: Duration },
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Dependency unavailable: {detail}")]
    DependencyUnavailable { detail: String },
    #[error("Internal error: {detail}")]
    Internal { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

const INVALID_CREDENTIALS_DETAIL: &str = "Incorrect username or password";
const UNAUTHENTICATED_DETAIL: &str = "Could not validate credentials";

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::Unauthorized { code, .. } => *code,
            AppError::TooManyAttempts { .. } => ErrorCode::TooManyAttempts,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::NotFound { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::DependencyUnavailable { .. } => ErrorCode::DependencyUnavailable,
            AppError::Internal { code, .. } => *code,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Client-facing detail. Internal and config details stay server-side.
    pub fn detail(&self) -> String {
        match self {
            AppError::Validation { detail, .. }
            | AppError::Unauthorized { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::DependencyUnavailable { detail } => detail.clone(),
            AppError::TooManyAttempts { .. } => {
                "Too many login attempts, try again later".to_string()
            }
            AppError::Forbidden => "Access denied".to_string(),
            AppError::Internal { .. } | AppError::Config { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::DependencyUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } | AppError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::MalformedRequest,
            detail: detail.into(),
        }
    }

    pub fn invalid(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::Unauthorized {
            code: ErrorCode::InvalidCredentials,
            detail: INVALID_CREDENTIALS_DETAIL.to_string(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthorized {
            code: ErrorCode::Unauthenticated,
            detail: UNAUTHENTICATED_DETAIL.to_string(),
        }
    }

    pub fn unauthorized_missing_bearer() -> Self {
        Self::Unauthorized {
            code: ErrorCode::UnauthorizedMissingBearer,
            detail: "Not authenticated".to_string(),
        }
    }

    pub fn forbidden() -> Self {
        Self::Forbidden
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::Internal,
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn dependency_unavailable(detail: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            detail: detail.into(),
        }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MalformedRequest(detail) => AppError::malformed(detail),
            AuthError::InvalidCredentials => AppError::invalid_credentials(),
            AuthError::Unauthenticated => AppError::unauthenticated(),
            AuthError::TooManyAttempts { retry_after } => AppError::TooManyAttempts { retry_after },
            AuthError::DependencyUnavailable(detail) => AppError::dependency_unavailable(detail),
            AuthError::Internal(detail) => AppError::internal(detail),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(kind, detail) => {
                let code = match kind {
                    ValidationKind::InvalidEmail => ErrorCode::InvalidEmail,
                    ValidationKind::WeakPassword => ErrorCode::WeakPassword,
                    _ => ErrorCode::ValidationError,
                };
                AppError::Validation { code, detail }
            }
            DomainError::Conflict(kind, detail) => {
                let code = match kind {
                    ConflictKind::UniqueEmail => ErrorCode::UniqueEmail,
                    _ => ErrorCode::Conflict,
                };
                AppError::Conflict { code, detail }
            }
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::User => ErrorCode::UserNotFound,
                    _ => ErrorCode::NotFound,
                };
                AppError::NotFound { code, detail }
            }
            DomainError::Infra(InfraErrorKind::DbUnavailable | InfraErrorKind::Timeout, detail) => {
                AppError::dependency_unavailable(detail)
            }
            DomainError::Infra(InfraErrorKind::DataCorruption, detail) => AppError::Internal {
                code: ErrorCode::DataCorruption,
                detail,
            },
            DomainError::Infra(_, detail) => AppError::internal(detail),
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::from(e).into()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code();
        let trace_id = trace_ctx::trace_id();

        if status.is_server_error() {
            tracing::error!(code = %code, error = %self, %trace_id, "request failed");
        }

        let problem_details = ProblemDetails {
            type_: format!("https://profile-doctor.app/errors/{code}"),
            title: Self::humanize_code(code.as_str()),
            status: status.as_u16(),
            detail: self.detail(),
            code: code.to_string(),
            trace_id: trace_id.clone(),
        };

        let mut builder = HttpResponse::build(status);
        builder
            .content_type("application/problem+json")
            .insert_header(("x-trace-id", trace_id));

        match self {
            AppError::Unauthorized { .. } => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
            }
            AppError::TooManyAttempts { retry_after } => {
                builder.insert_header((header::RETRY_AFTER, retry_after.as_secs().max(1).to_string()));
            }
            _ => {}
        }

        builder.json(problem_details)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::body::to_bytes;
    use actix_web::http::{header, StatusCode};
    use actix_web::ResponseError;
    use serde_json::Value;

    use super::AppError;
    use crate::auth::AuthError;
    use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};
    use crate::errors::ErrorCode;

    #[test]
    fn auth_errors_map_to_contract_statuses() {
        let cases = [
            (AuthError::MalformedRequest("x".into()), 422, ErrorCode::MalformedRequest),
            (AuthError::InvalidCredentials, 401, ErrorCode::InvalidCredentials),
            (AuthError::Unauthenticated, 401, ErrorCode::Unauthenticated),
            (
                AuthError::TooManyAttempts {
                    retry_after: Duration::from_secs(30),
                },
                429,
                ErrorCode::TooManyAttempts,
            ),
            (
                AuthError::DependencyUnavailable("redis".into()),
                503,
                ErrorCode::DependencyUnavailable,
            ),
            (AuthError::Internal("boom".into()), 500, ErrorCode::Internal),
        ];

        for (auth, status, code) in cases {
            let app: AppError = auth.into();
            assert_eq!(app.status().as_u16(), status);
            assert_eq!(app.code(), code);
        }
    }

    #[test]
    fn domain_errors_map_to_app_errors() {
        let app: AppError =
            DomainError::conflict(ConflictKind::UniqueEmail, "Email already registered").into();
        assert_eq!(app.status(), StatusCode::CONFLICT);
        assert_eq!(app.code(), ErrorCode::UniqueEmail);

        let app: AppError = DomainError::infra(InfraErrorKind::DbUnavailable, "down").into();
        assert_eq!(app.status(), StatusCode::SERVICE_UNAVAILABLE);

        let app: AppError = DomainError::infra(InfraErrorKind::DataCorruption, "bad role").into();
        assert_eq!(app.code(), ErrorCode::DataCorruption);
        assert_eq!(app.detail(), "Internal server error");
    }

    #[actix_web::test]
    async fn unauthorized_responses_carry_bearer_challenge() {
        let resp = AppError::invalid_credentials().error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body: Value = serde_json::from_slice(&to_bytes(resp.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
        assert_eq!(body["detail"], "Incorrect username or password");
        assert_eq!(body["title"], "Invalid Credentials");
    }

    #[actix_web::test]
    async fn rate_limited_responses_carry_retry_after() {
        let resp = AppError::TooManyAttempts {
            retry_after: Duration::from_secs(17),
        }
        .error_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "17");
        assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = AppError::internal("connection string postgres://secret");
        assert_eq!(err.detail(), "Internal server error");
    }
}
