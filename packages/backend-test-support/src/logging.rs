//! Test subscriber shared by unit and integration tests.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn filter() -> EnvFilter {
    std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the test subscriber once per process.
///
/// Level comes from `TEST_LOG`, then `RUST_LOG`, else `warn`. Set
/// `TEST_LOG_JSON=1` to see the same JSON lines the server emits. Output goes
/// through the test writer so the harness captures it per test.
pub fn init() {
    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_test_writer()
            .without_time();

        let installed = if std::env::var_os("TEST_LOG_JSON").is_some() {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        // Another harness may have installed a global subscriber first.
        installed.ok();
    });
}
