//! Core platform API: space, kapps, forms, people and configuration.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::api::collection::Collection;
use crate::client::Endpoint;
use crate::error::{Error, Result};
use crate::export::ExportShape;
use crate::http::{Query, RequestBody, Response};

/// Layout of a space export on disk.
pub const SPACE_EXPORT_SHAPE: &[&str] = &[
    "space.kapps.{slug}",
    "space.kapps.{slug}.categories",
    "space.kapps.{slug}.categoryAttributeDefinitions",
    "space.kapps.{slug}.formAttributeDefinitions",
    "space.kapps.{slug}.formTypes",
    "space.kapps.{slug}.forms.{slug}",
    "space.kapps.{slug}.kappAttributeDefinitions",
    "space.kapps.{slug}.securityPolicyDefinitions",
    "space.kapps.{slug}.webhooks.{name}",
    "space.models.{name}",
    "space.securityPolicyDefinitions",
    "space.spaceAttributeDefinitions",
    "space.teamAttributeDefinitions",
    "space.teams.{name}",
    "space.userAttributeDefinitions",
    "space.userProfileAttributeDefinitions",
    "space.webhooks.{name}",
];

/// Where an attribute definition lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeScope<'a> {
    Space,
    User,
    UserProfile,
    Team,
    Kapp(&'a str),
    Form(&'a str),
    Category(&'a str),
}

impl AttributeScope<'_> {
    fn segments(&self) -> Vec<&str> {
        match self {
            AttributeScope::Space => vec!["spaceAttributeDefinitions"],
            AttributeScope::User => vec!["userAttributeDefinitions"],
            AttributeScope::UserProfile => vec!["userProfileAttributeDefinitions"],
            AttributeScope::Team => vec!["teamAttributeDefinitions"],
            AttributeScope::Kapp(kapp) => vec!["kapps", kapp, "kappAttributeDefinitions"],
            AttributeScope::Form(kapp) => vec!["kapps", kapp, "formAttributeDefinitions"],
            AttributeScope::Category(kapp) => vec!["kapps", kapp, "categoryAttributeDefinitions"],
        }
    }
}

/// Core API client.
#[derive(Clone, Debug)]
pub struct CoreApi {
    endpoint: Endpoint,
}

impl CoreApi {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The authenticated user.
    pub async fn me(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&["me"], query).await
    }

    /// Fetch the space.
    pub async fn find_space(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&["space"], query).await
    }

    /// Update the space.
    pub async fn update_space(&self, body: impl Into<RequestBody>) -> Result<Response> {
        self.endpoint.put(&["space"], body).await
    }

    pub fn kapps(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["kapps"])
    }

    /// Forms of one kapp.
    pub fn forms(&self, kapp: &str) -> Collection {
        Collection::new(self.endpoint.clone(), &["kapps", kapp, "forms"])
    }

    /// Categories of one kapp.
    pub fn categories(&self, kapp: &str) -> Collection {
        Collection::new(self.endpoint.clone(), &["kapps", kapp, "categories"])
    }

    pub fn submissions(&self) -> SubmissionsApi {
        SubmissionsApi {
            endpoint: self.endpoint.clone(),
        }
    }

    pub fn users(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["users"])
    }

    /// Teams, addressed by slug.
    pub fn teams(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["teams"])
    }

    pub fn attribute_definitions(&self, scope: AttributeScope<'_>) -> Collection {
        Collection::new(self.endpoint.clone(), &scope.segments())
    }

    /// Space webhooks, or a kapp's webhooks when `kapp` is set.
    pub fn webhooks(&self, kapp: Option<&str>) -> Collection {
        match kapp {
            Some(kapp) => Collection::new(self.endpoint.clone(), &["kapps", kapp, "webhooks"]),
            None => Collection::new(self.endpoint.clone(), &["webhooks"]),
        }
    }

    /// Bridge models, addressed by name.
    pub fn bridge_models(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["models"])
    }

    /// Space security policy definitions, or a kapp's when `kapp` is set.
    pub fn security_policy_definitions(&self, kapp: Option<&str>) -> Collection {
        match kapp {
            Some(kapp) => Collection::new(
                self.endpoint.clone(),
                &["kapps", kapp, "securityPolicyDefinitions"],
            ),
            None => Collection::new(self.endpoint.clone(), &["securityPolicyDefinitions"]),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export / import
    // ─────────────────────────────────────────────────────────────────────────

    /// Export the space definition into the configured export directory.
    ///
    /// Returns the files written.
    pub async fn export_space(&self) -> Result<Vec<PathBuf>> {
        let directory = self.export_directory("export_space")?;
        self.export_space_to(&directory).await
    }

    /// Export the space definition into `directory`.
    pub async fn export_space_to(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let response = self
            .endpoint
            .get(&["space"], &Query::new().param("export", true))
            .await?
            .ensure_success()?;
        let document = response.content().ok_or_else(|| Error::Api {
            status: response.status(),
            message: "space export is not JSON".to_string(),
        })?;

        tracing::info!(directory = %directory.display(), "Exporting space");
        let written = ExportShape::from_templates(SPACE_EXPORT_SHAPE).process_export(directory, document)?;
        tracing::info!(files = written.len(), "Space export complete");
        Ok(written)
    }

    /// Reassemble the configured export directory and import it.
    pub async fn import_space(&self) -> Result<Response> {
        let directory = self.export_directory("import_space")?;
        self.import_space_from(&directory).await
    }

    /// Reassemble an export directory and `PUT space?import=true`.
    pub async fn import_space_from(&self, directory: &Path) -> Result<Response> {
        let document = ExportShape::from_templates(SPACE_EXPORT_SHAPE).assemble(directory)?;
        let space = document.get("space").cloned().ok_or_else(|| {
            Error::Config(format!(
                "{} has no space definition to import",
                directory.display()
            ))
        })?;

        tracing::info!(directory = %directory.display(), "Importing space");
        self.endpoint
            .put_with_query(&["space"], &Query::new().param("import", true), space)
            .await
    }

    fn export_directory(&self, operation: &str) -> Result<PathBuf> {
        Ok(self
            .endpoint
            .client()
            .options()
            .require_export_directory(operation)?
            .to_path_buf())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Submissions
// ─────────────────────────────────────────────────────────────────────────────

/// Submissions API client.
///
/// Submissions are fetched by id but searched and created through their
/// kapp or form.
#[derive(Clone, Debug)]
pub struct SubmissionsApi {
    endpoint: Endpoint,
}

impl SubmissionsApi {
    pub async fn get(&self, id: &str, query: &Query) -> Result<Response> {
        self.endpoint.get(&["submissions", id], query).await
    }

    /// One page of a form's submissions.
    pub async fn search_form(&self, kapp: &str, form: &str, query: &Query) -> Result<Response> {
        self.endpoint
            .get(&["kapps", kapp, "forms", form, "submissions"], query)
            .await
    }

    /// One page of a kapp's submissions.
    pub async fn search_kapp(&self, kapp: &str, query: &Query) -> Result<Response> {
        self.endpoint.get(&["kapps", kapp, "submissions"], query).await
    }

    /// Every submission of a form, following page tokens.
    pub async fn search_form_all(&self, kapp: &str, form: &str, query: &Query) -> Result<Vec<Value>> {
        super::collection::collect_pages(
            &self.endpoint,
            &["kapps", kapp, "forms", form, "submissions"],
            query,
            "submissions",
        )
        .await
    }

    /// Create a submission; `body` typically carries `values` and
    /// optionally `coreState`.
    pub async fn create(
        &self,
        kapp: &str,
        form: &str,
        body: impl Into<RequestBody>,
        query: &Query,
    ) -> Result<Response> {
        self.endpoint
            .post_with_query(&["kapps", kapp, "forms", form, "submissions"], query, body)
            .await
    }

    pub async fn update(&self, id: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.endpoint.put(&["submissions", id], body).await
    }

    pub async fn delete(&self, id: &str) -> Result<Response> {
        self.endpoint.delete(&["submissions", id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KineticClient;

    fn core() -> CoreApi {
        KineticClient::builder()
            .server("http://localhost:8080/kinetic")
            .space("acme")
            .build()
            .unwrap()
            .core()
    }

    #[test]
    fn test_collection_paths() {
        let core = core();
        assert_eq!(
            core.forms("services").url().as_str(),
            "http://localhost:8080/kinetic/acme/app/api/v1/kapps/services/forms"
        );
        assert_eq!(
            core.attribute_definitions(AttributeScope::Kapp("services"))
                .url()
                .path(),
            "/kinetic/acme/app/api/v1/kapps/services/kappAttributeDefinitions"
        );
        assert_eq!(
            core.webhooks(None).url().path(),
            "/kinetic/acme/app/api/v1/webhooks"
        );
        assert_eq!(
            core.security_policy_definitions(Some("hr")).url().path(),
            "/kinetic/acme/app/api/v1/kapps/hr/securityPolicyDefinitions"
        );
    }

    #[test]
    fn test_export_shape_declares_forms() {
        let shape = ExportShape::from_templates(SPACE_EXPORT_SHAPE);
        assert!(shape.should_extract("space.kapps.services.forms.intake"));
        assert!(shape.should_extract("space.teams.Admins"));
        assert!(!shape.should_extract("space.kapps.services.name"));
    }

    #[tokio::test]
    async fn test_export_requires_directory() {
        let result = core().export_space().await;
        assert!(matches!(result, Err(Error::ConfigFile(_))));
    }

    #[tokio::test]
    async fn test_import_without_space_document_fails() {
        let dir = tempfile::tempdir().unwrap();

        // Nothing listens on the server; the error comes before any request
        let result = core().import_space_from(dir.path()).await;
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("no space definition")));
    }
}
