/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bittrex-adapter tests

use bittrex_adapter::Credentials;
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Deterministic credentials for signed-request tests
pub fn test_credentials() -> Credentials {
    Credentials::new("test-key", "test-secret")
}

/// Matches requests carrying a hex HMAC-SHA512 `apisign` header
pub struct HasApiSign;

impl wiremock::Match for HasApiSign {
    fn matches(&self, request: &wiremock::Request) -> bool {
        request
            .headers
            .get("apisign")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.len() == 128 && value.chars().all(|c| c.is_ascii_hexdigit()))
            .unwrap_or(false)
    }
}
