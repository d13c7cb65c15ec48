//! Shared helpers for integration tests.

#![allow(dead_code)]

use kinetic_sdk::{ClientBuilder, KineticClient};
use wiremock::MockServer;

/// Builder pointed at a mock server with retries that don't sleep.
pub fn builder(server: &MockServer) -> ClientBuilder {
    KineticClient::builder()
        .server(server.uri())
        .gateway_retry_delay(0.0)
}

/// Client pointed at a mock server with Basic credentials.
pub fn client(server: &MockServer) -> KineticClient {
    builder(server)
        .basic_auth("admin", "secret")
        .build()
        .expect("client should build")
}

/// Space-scoped client pointed at a mock server.
pub fn space_client(server: &MockServer, space: &str) -> KineticClient {
    builder(server)
        .space(space)
        .basic_auth("admin", "secret")
        .build()
        .expect("client should build")
}
