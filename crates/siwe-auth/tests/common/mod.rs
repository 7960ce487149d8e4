/*
[INPUT]:  Test configuration and mock wallet requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for siwe-auth tests

use std::sync::Arc;

use chrono::{DateTime, Utc};
use siwe_auth::wallet::MockConnector;
use siwe_auth::{
    AuthConfig, AuthStateMachine, Connector, InMemoryWalletRuntime, LocalKeyConnector,
    WalletRegistry, fixed_clock,
};
use wiremock::MockServer;

/// Hardhat account #0
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Setup a mock HTTP server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn test_issued_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .map(|instant| instant.with_timezone(&Utc))
        .expect("valid timestamp")
}

pub fn test_config() -> AuthConfig {
    AuthConfig::new("app.example.com", "https://app.example.com")
}

#[allow(dead_code)]
pub fn metamask_mock() -> MockConnector {
    MockConnector::new("io.metamask", "Metamask")
}

#[allow(dead_code)]
pub fn metamask_local_key() -> LocalKeyConnector {
    LocalKeyConnector::new("io.metamask", "Metamask", TEST_PRIVATE_KEY, 97, vec![97])
        .expect("valid test key")
}

/// State machine over an in-memory runtime exposing `connectors`, with a fixed clock
pub fn machine_with(
    config: AuthConfig,
    connectors: Vec<Arc<dyn Connector>>,
) -> (AuthStateMachine, Arc<InMemoryWalletRuntime>) {
    let runtime = Arc::new(InMemoryWalletRuntime::with_connectors(connectors));
    let machine = AuthStateMachine::new(config, WalletRegistry::default(), runtime.clone())
        .expect("valid config")
        .with_clock(fixed_clock(test_issued_at()));
    (machine, runtime)
}
