//! Task engine API: trees, handlers, sources, runs and the engine itself.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::api::collection::Collection;
use crate::client::Endpoint;
use crate::error::Result;
use crate::export::slugify;
use crate::http::{FormField, Query, RequestBody, Response};

/// Separator between source, group and name in a tree title.
const TITLE_SEPARATOR: &str = " :: ";

/// Task API client.
#[derive(Clone, Debug)]
pub struct TaskApi {
    endpoint: Endpoint,
}

impl TaskApi {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn trees(&self) -> TreesApi {
        TreesApi {
            endpoint: self.endpoint.clone(),
        }
    }

    pub fn handlers(&self) -> HandlersApi {
        HandlersApi {
            endpoint: self.endpoint.clone(),
        }
    }

    pub fn sources(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["sources"])
    }

    pub fn categories(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["categories"])
    }

    pub fn runs(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["runs"])
    }

    pub fn engine(&self) -> EngineApi {
        EngineApi {
            endpoint: self.endpoint.clone(),
        }
    }

    /// Task server health.
    pub async fn health(&self) -> Result<Response> {
        self.endpoint.get(&["healthz"], &Query::new()).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trees
// ─────────────────────────────────────────────────────────────────────────────

/// Trees API client.
///
/// Trees are addressed by title, `"<source> :: <group> :: <name>"`.
#[derive(Clone, Debug)]
pub struct TreesApi {
    endpoint: Endpoint,
}

impl TreesApi {
    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&["trees"], query).await
    }

    pub async fn get(&self, title: &str, query: &Query) -> Result<Response> {
        self.endpoint.get(&["trees", title], query).await
    }

    pub async fn create(&self, body: impl Into<RequestBody>) -> Result<Response> {
        self.endpoint.post(&["trees"], body).await
    }

    pub async fn update(&self, title: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.endpoint.put(&["trees", title], body).await
    }

    pub async fn delete(&self, title: &str) -> Result<Response> {
        self.endpoint.delete(&["trees", title]).await
    }

    /// Stream a tree's XML definition to `destination`.
    pub async fn export(&self, title: &str, destination: &Path) -> Result<Response> {
        self.endpoint
            .download(&["trees", title, "export"], &Query::new(), destination)
            .await
    }

    /// Export a tree's XML into the configured export directory.
    ///
    /// Returns the file path alongside the response; nothing is written
    /// when the server answers non-2xx.
    pub async fn export_to_directory(&self, title: &str) -> Result<(PathBuf, Response)> {
        let directory = self
            .endpoint
            .client()
            .options()
            .require_export_directory("export_tree")?
            .clone();
        let destination = tree_export_path(&directory, title);
        let response = self.export(title, &destination).await?;
        Ok((destination, response))
    }

    /// Upload a tree XML file. `force` overwrites an existing tree.
    pub async fn import(&self, file: &Path, force: bool) -> Result<Response> {
        self.endpoint
            .post_multipart(
                &["trees"],
                &Query::new().param("force", force),
                vec![FormField::file("content", file)],
            )
            .await
    }
}

/// On-disk location of an exported tree:
/// `sources/<source>/trees/<group>.<name>.xml`, or `trees/<title>.xml`
/// when the title isn't a three-part tree title.
pub fn tree_export_path(directory: &Path, title: &str) -> PathBuf {
    let parts: Vec<&str> = title.split(TITLE_SEPARATOR).collect();
    match parts.as_slice() {
        [source, group, name] => directory
            .join("sources")
            .join(slugify(source))
            .join("trees")
            .join(format!("{}.{}.xml", slugify(group), slugify(name))),
        _ => directory.join("trees").join(format!("{}.xml", slugify(title))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Handlers API client.
#[derive(Clone, Debug)]
pub struct HandlersApi {
    endpoint: Endpoint,
}

impl HandlersApi {
    fn collection(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["handlers"])
    }

    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.collection().list(query).await
    }

    pub async fn get(&self, definition_id: &str, query: &Query) -> Result<Response> {
        self.collection().get(definition_id, query).await
    }

    pub async fn update(&self, definition_id: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.collection().update(definition_id, body).await
    }

    pub async fn delete(&self, definition_id: &str) -> Result<Response> {
        self.collection().delete(definition_id).await
    }

    /// Upload a handler zip package. `force` overwrites an existing handler.
    pub async fn import(&self, package: &Path, force: bool) -> Result<Response> {
        self.endpoint
            .post_multipart(
                &["handlers"],
                &Query::new().param("force", force),
                vec![FormField::file("package", package)],
            )
            .await
    }

    /// Stream a handler package to `destination`.
    pub async fn export(&self, definition_id: &str, destination: &Path) -> Result<Response> {
        self.endpoint
            .download(&["handlers", definition_id, "export"], &Query::new(), destination)
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Task engine control.
#[derive(Clone, Debug)]
pub struct EngineApi {
    endpoint: Endpoint,
}

impl EngineApi {
    pub async fn status(&self) -> Result<Response> {
        self.endpoint.get(&["engine"], &Query::new()).await
    }

    pub async fn start(&self) -> Result<Response> {
        self.action("start").await
    }

    pub async fn stop(&self) -> Result<Response> {
        self.action("stop").await
    }

    async fn action(&self, action: &str) -> Result<Response> {
        tracing::info!(action, "Task engine action");
        self.endpoint
            .post(&["engine"], json!({ "action": action }))
            .await
    }
}
