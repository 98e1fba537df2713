#![allow(dead_code)]

// tests/common/mod.rs
use actix_web::http::header::{HeaderMap, RETRY_AFTER, WWW_AUTHENTICATE};

// Logging is auto-installed for every test binary that declares `mod common;`
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// 401s challenge with `Bearer` and never carry `Retry-After`.
pub fn assert_bearer_challenge(headers: &HeaderMap) {
    let challenge = headers
        .get(WWW_AUTHENTICATE)
        .expect("401 responses must have WWW-Authenticate")
        .to_str()
        .expect("WWW-Authenticate should be valid UTF-8");
    assert_eq!(challenge, "Bearer");
    assert!(headers.get(RETRY_AFTER).is_none());
}

/// `Retry-After` as whole seconds.
pub fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .expect("429 responses must have Retry-After")
        .to_str()
        .expect("Retry-After should be valid UTF-8")
        .parse()
        .expect("Retry-After should be delta-seconds")
}
