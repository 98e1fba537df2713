//! Problem Details test helpers
//!
//! Assertions over the backend's error contract that do not depend on
//! backend types.

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use serde::Deserialize;

/// Mirror of the backend's Problem Details body.
#[derive(Debug, Deserialize)]
pub struct ProblemDetailsLike {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

/// Assert that response parts conform to the error contract and return the
/// parsed body for further checks.
///
/// Validates:
/// - HTTP status matches expected
/// - `content-type` is `application/problem+json`
/// - `x-trace-id` header exists and matches body `trace_id`
/// - `code`/`status` fields, and `detail` when `expected_detail` is given
pub fn assert_problem_details_from_parts(
    status: StatusCode,
    headers: &HeaderMap,
    body_bytes: &[u8],
    expected_code: &str,
    expected_status: StatusCode,
    expected_detail: Option<&str>,
) -> ProblemDetailsLike {
    assert_eq!(status, expected_status);

    let content_type = headers
        .get("content-type")
        .expect("content-type header should be present")
        .to_str()
        .expect("content-type should be valid UTF-8");
    assert!(
        content_type.contains("application/problem+json"),
        "unexpected content-type {content_type}"
    );

    let problem: ProblemDetailsLike = serde_json::from_slice(body_bytes)
        .expect("Response body should be valid ProblemDetails JSON");

    let trace_id_header = headers
        .get("x-trace-id")
        .expect("x-trace-id header should be present")
        .to_str()
        .expect("x-trace-id header should be valid UTF-8");
    assert_eq!(
        problem.trace_id, trace_id_header,
        "trace_id in body should match x-trace-id header"
    );

    assert_eq!(problem.code, expected_code);
    assert_eq!(problem.status, expected_status.as_u16());

    if let Some(expected_detail) = expected_detail {
        assert_eq!(problem.detail, expected_detail);
    }

    problem
}

/// Same as [`assert_problem_details_from_parts`], reading a `ServiceResponse`.
/// Returns the response headers alongside the parsed body.
pub async fn assert_problem_details_from_service_response(
    resp: ServiceResponse<BoxBody>,
    expected_code: &str,
    expected_status: StatusCode,
    expected_detail: Option<&str>,
) -> (HeaderMap, ProblemDetailsLike) {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = actix_web::test::read_body(resp).await;

    let problem = assert_problem_details_from_parts(
        status,
        &headers,
        &body,
        expected_code,
        expected_status,
        expected_detail,
    );
    (headers, problem)
}
