/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for walletlink-adapter tests

use walletlink_adapter::{LoginClient, SessionBinder, SessionSettings};
use wiremock::MockServer;

/// Well-known development key and its checksummed address
#[allow(dead_code)]
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
#[allow(dead_code)]
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Session binder pointed at the mock server's login path
#[allow(dead_code)]
pub fn binder_for(server: &MockServer) -> SessionBinder {
    let client = LoginClient::new(&format!("{}/api/auth/login", server.uri()))
        .expect("mock server uri is a valid url");
    SessionBinder::new(client, SessionSettings::default())
}

/// Successful login envelope
#[allow(dead_code)]
pub fn login_success(token: &str) -> serde_json::Value {
    serde_json::json!({
        "code": 200,
        "data": {"accessToken": token, "nickname": "tester"},
    })
}
