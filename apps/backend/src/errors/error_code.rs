//! Error codes for the backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that appear
//! in HTTP responses.

use core::fmt;

/// Centralized error codes for the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Username/password pair rejected (also used for unknown accounts)
    InvalidCredentials,
    /// Bearer token invalid, expired, or its subject no longer exists
    Unauthenticated,
    /// Missing or malformed Bearer token
    UnauthorizedMissingBearer,
    /// Login attempts exceeded for the current window
    TooManyAttempts,
    /// Authenticated, but the role does not permit the operation
    Forbidden,

    // Request Validation
    /// Required request fields missing or empty
    MalformedRequest,
    /// Invalid email address
    InvalidEmail,
    /// Password does not meet the minimum policy
    WeakPassword,
    /// General validation error
    ValidationError,

    // Resource Not Found
    /// User not found
    UserNotFound,
    /// General not found error
    NotFound,

    // Conflicts
    /// Unique email constraint
    UniqueEmail,
    /// Generic conflict
    Conflict,

    // System Errors
    /// A backing service (database, counter store) is unreachable
    DependencyUnavailable,
    /// Data read from storage violates an invariant
    DataCorruption,
    /// Configuration error
    ConfigError,
    /// Internal server error
    Internal,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::Forbidden => "FORBIDDEN",

            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::ValidationError => "VALIDATION_ERROR",

            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::UniqueEmail => "UNIQUE_EMAIL",
            Self::Conflict => "CONFLICT",

            Self::DependencyUnavailable => "DEPENDENCY_UNAVAILABLE",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
