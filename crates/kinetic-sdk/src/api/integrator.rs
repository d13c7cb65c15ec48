//! Integrator API: connections and their operations.

use crate::api::collection::Collection;
use crate::client::Endpoint;
use crate::error::Result;
use crate::http::{RequestBody, Response};

/// Integrator API client.
#[derive(Clone, Debug)]
pub struct IntegratorApi {
    endpoint: Endpoint,
}

impl IntegratorApi {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Connections, addressed by id.
    pub fn connections(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["connections"])
    }

    /// Operations of one connection, addressed by id.
    pub fn operations(&self, connection_id: &str) -> Collection {
        self.connections().nested(connection_id, &["operations"])
    }

    /// Run an operation with the given parameters.
    pub async fn execute(
        &self,
        connection_id: &str,
        operation_id: &str,
        parameters: impl Into<RequestBody>,
    ) -> Result<Response> {
        tracing::debug!(connection_id, operation_id, "Executing integrator operation");
        self.endpoint
            .post(
                &["connections", connection_id, "operations", operation_id, "execute"],
                parameters,
            )
            .await
    }
}
