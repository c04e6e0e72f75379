//! Assertion helpers
//!
//! Error responses carry `{"error", "kind", "status"}`; tests match on the
//! stable `kind` rather than on message text.

use axum::http::StatusCode;
use axum_test::TestResponse;

/// Assert a response failed with the given status and error kind
pub fn assert_error(response: &TestResponse, status: StatusCode, kind: &str) {
    assert_eq!(
        response.status_code(),
        status,
        "unexpected status, body: {}",
        response.text()
    );
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], kind, "unexpected error kind, body: {body}");
    assert_eq!(body["status"], status.as_u16());
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
