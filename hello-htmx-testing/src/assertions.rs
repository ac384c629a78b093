// Test assertions for HTTP responses

use crate::TestResponse;

/// Assert that a response has a specific status code
pub fn assert_status(response: &TestResponse, expected: u16) {
    let actual = response.status();
    assert_eq!(
        actual,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        actual,
        response.text()
    );
}

/// Assert that a response body contains JSON matching expected value
pub fn assert_json<T>(response: &TestResponse, expected: &T)
where
    T: serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let actual: T = response
        .json()
        .expect("Failed to deserialize response body");
    assert_eq!(actual, *expected, "JSON bodies do not match");
}

/// Assert that a response has a specific header
pub fn assert_header(response: &TestResponse, key: &str, expected: &str) {
    let actual = response.header(key);
    assert_eq!(
        actual,
        Some(expected),
        "Expected header '{}' to be '{}', got {:?}",
        key,
        expected,
        actual
    );
}

/// Assert that a response body contains a string
pub fn assert_body_contains(response: &TestResponse, expected: &str) {
    let body = response.text();
    assert!(
        body.contains(expected),
        "Expected body to contain '{}', but it didn't. Body: {}",
        expected,
        body
    );
}

pub fn assert_body_not_contains(response: &TestResponse, unexpected: &str) {
    let body = response.text();
    assert!(
        !body.contains(unexpected),
        "Expected body not to contain '{}'. Body: {}",
        unexpected,
        body
    );
}

/// Assert that a response is successful (2xx status)
pub fn assert_success(response: &TestResponse) {
    let status = response.status();
    assert!(
        (200..300).contains(&status),
        "Expected successful status (2xx), got {}",
        status
    );
}

/// Assert that a response is a client error (4xx status)
pub fn assert_client_error(response: &TestResponse) {
    let status = response.status();
    assert!(
        (400..500).contains(&status),
        "Expected client error status (4xx), got {}",
        status
    );
}

/// Assert that a response has HTML content type
pub fn assert_html_content_type(response: &TestResponse) {
    let content_type = response.header("Content-Type");
    assert!(
        content_type.is_some_and(|ct| ct.contains("text/html")),
        "Expected HTML content type, got {:?}",
        content_type
    );
}

/// Assert that a response sets the named cookie, returning its value
pub fn assert_sets_cookie(response: &TestResponse, name: &str) -> String {
    response
        .cookie_value(name)
        .unwrap_or_else(|| panic!("Expected response to set cookie '{}'", name))
}

/// Assert that a response leaves the named cookie alone
pub fn assert_no_cookie(response: &TestResponse, name: &str) {
    assert!(
        response.cookie(name).is_none(),
        "Expected no '{}' cookie, got {:?}",
        name,
        response.cookie_value(name)
    );
}
