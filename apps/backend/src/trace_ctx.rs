//! Task-local trace context for web requests.
//!
//! `RequestTrace` runs every request inside [`with_trace_id`]; error rendering
//! and security logging read it back through [`trace_id`] so both carry the
//! same id as the `x-trace-id` response header.

use tokio::task_local;

task_local! {
    static TRACE_ID: String;
}

/// Trace id of the current request, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Run a future within a trace context.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
