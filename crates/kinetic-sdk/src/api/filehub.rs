//! File hub API.

use crate::api::collection::Collection;
use crate::client::Endpoint;

/// File hub API client.
#[derive(Clone, Debug)]
pub struct FilehubApi {
    endpoint: Endpoint,
}

impl FilehubApi {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Filestores, addressed by slug.
    pub fn filestores(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["filestores"])
    }

    /// Access keys of one filestore, addressed by id.
    pub fn access_keys(&self, filestore: &str) -> Collection {
        self.filestores().nested(filestore, &["access-keys"])
    }
}
