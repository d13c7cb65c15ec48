//! Agent API: bridges, handlers and filestores hosted by an agent.

use crate::api::collection::Collection;
use crate::client::Endpoint;

/// Agent API client.
#[derive(Clone, Debug)]
pub struct AgentApi {
    endpoint: Endpoint,
}

impl AgentApi {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Bridges, addressed by slug.
    pub fn bridges(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["bridges"])
    }

    /// Handlers, addressed by slug.
    pub fn handlers(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["handlers"])
    }

    /// Filestores, addressed by slug.
    pub fn filestores(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["filestores"])
    }
}
