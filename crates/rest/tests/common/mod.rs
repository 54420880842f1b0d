//! Shared harness for the REST integration tests.

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use helios_vstore::backends::memory::InMemoryStore;
use helios_vstore_rest::{ServerConfig, create_app_with_config};
use serde_json::{Value, json};

pub const IF_MATCH: HeaderName = HeaderName::from_static("if-match");
pub const IF_NONE_MATCH: HeaderName = HeaderName::from_static("if-none-match");
pub const IF_MODIFIED_SINCE: HeaderName = HeaderName::from_static("if-modified-since");
pub const PREFER: HeaderName = HeaderName::from_static("prefer");

pub const BASE_URL: &str = "http://localhost:8080";

/// Test configuration with a fixed base URL.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        base_url: BASE_URL.to_string(),
        ..ServerConfig::for_testing()
    }
}

/// Creates a test server over an in-memory store.
pub fn create_test_server() -> TestServer {
    create_test_server_with(test_config())
}

/// Creates a test server over an in-memory store with `config`.
pub fn create_test_server_with(config: ServerConfig) -> TestServer {
    let app = create_app_with_config(InMemoryStore::new(), config);
    TestServer::new(app).expect("Failed to create test server")
}

/// A minimal Patient body.
pub fn patient(family: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "name": [{"family": family}],
        "active": true
    })
}

/// A Patient body carrying `id`.
pub fn patient_with_id(id: &str, family: &str) -> Value {
    let mut body = patient(family);
    body["id"] = json!(id);
    body
}

/// Seeds `Patient/{id}` at version 1.
pub async fn seed_patient(server: &TestServer, id: &str, family: &str) {
    server
        .put(&format!("/Patient/{}", id))
        .json(&patient_with_id(id, family))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

/// Returns a response header as a string.
pub fn header(response: &TestResponse, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Returns the first issue code of an OperationOutcome body.
pub fn issue_code(response: &TestResponse) -> String {
    let body: Value = response.json();
    body["issue"][0]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Builds a header value from a string.
pub fn value(s: &str) -> HeaderValue {
    HeaderValue::from_str(s).expect("valid header value")
}
