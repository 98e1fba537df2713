use tracing::warn;

use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Login attempt that did not produce a token. `reason` is internal only;
/// clients always see the same response for unknown user and wrong password.
pub fn login_failed(reason: &str, email: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_LOGIN_FAILED",
        %trace_id,
        email = %Redacted(email),
        reason,
        "Authentication failure"
    );
}

/// Login rejected by the attempt limiter.
pub fn rate_limit_hit(endpoint: &str, key: &str, count: u64) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_RATE_LIMIT_HIT",
        %trace_id,
        endpoint,
        key = %Redacted(key),
        count,
        "Rate limit exceeded"
    );
}

/// Bearer token that failed validation or named a vanished account.
pub fn token_rejected(reason: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_TOKEN_REJECTED",
        %trace_id,
        reason,
        "Bearer token rejected"
    );
}
