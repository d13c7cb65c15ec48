//! Main client implementation.

use std::path::Path;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use kinetic_config::{Credentials, ResolvedConnection, SdkOptions, SslVerifyMode};

use crate::api::{AgentApi, CoreApi, DiscussionsApi, FilehubApi, IntegratorApi, TaskApi};
use crate::auth;
use crate::error::{Error, Result};
use crate::http::{FormField, HttpTransport, Policy, Query, Request, RequestBody, Response};

/// Kinetic platform client.
///
/// One client talks to one server. Component façades ([`core`], [`task`],
/// [`discussions`], ...) derive their API base from the server URL and the
/// optional space slug.
///
/// # Example
///
/// ```no_run
/// use kinetic_sdk::{KineticClient, Query};
///
/// # async fn example() -> kinetic_sdk::Result<()> {
/// let client = KineticClient::builder()
///     .server("https://kinetic.example.com/kinetic")
///     .space("acme")
///     .basic_auth("admin", "password")
///     .build()?;
///
/// let kapps = client.core().kapps().list(&Query::new().include("details")).await?;
/// println!("{}", kapps.status());
/// # Ok(())
/// # }
/// ```
///
/// [`core`]: KineticClient::core
/// [`task`]: KineticClient::task
/// [`discussions`]: KineticClient::discussions
#[derive(Clone)]
pub struct KineticClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    pub(crate) transport: HttpTransport,
    pub(crate) server: Url,
    pub(crate) space: Option<String>,
    pub(crate) credentials: Credentials,
    pub(crate) headers: HeaderMap,
    pub(crate) options: SdkOptions,
    pub(crate) policy: Policy,
}

impl KineticClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client from a resolved connections-file context.
    pub fn from_connection(connection: &ResolvedConnection) -> Result<Self> {
        let mut builder = Self::builder()
            .server(&connection.server)
            .options(connection.options.clone());
        if let Some(space) = &connection.space {
            builder = builder.space(space);
        }
        builder = match &connection.credentials {
            Credentials::None => builder,
            Credentials::Basic { username, password } => builder.basic_auth(username, password),
            Credentials::Bearer { token } => builder.bearer_token(token),
        };
        builder.build()
    }

    /// Build a client from the connections file. `None` selects the
    /// current context.
    pub fn from_config(context: Option<&str>) -> Result<Self> {
        let file = kinetic_config::load_connections()?;
        let connection = match context {
            Some(name) => file.resolve(name)?,
            None => file.resolve_current()?,
        };
        Self::from_connection(&connection)
    }

    /// Server URL (no trailing slash).
    pub fn server(&self) -> &Url {
        &self.inner.server
    }

    /// Space slug, if the client is space-scoped.
    pub fn space(&self) -> Option<&str> {
        self.inner.space.as_deref()
    }

    pub fn options(&self) -> &SdkOptions {
        &self.inner.options
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Default redirect/retry policy for this client.
    pub fn policy(&self) -> &Policy {
        &self.inner.policy
    }

    /// A clone of this client using a different redirect/retry policy.
    pub fn with_policy(&self, policy: Policy) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(ClientInner {
                transport: inner.transport.clone(),
                server: inner.server.clone(),
                space: inner.space.clone(),
                credentials: inner.credentials.clone(),
                headers: inner.headers.clone(),
                options: inner.options.clone(),
                policy,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Component accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Core platform API (`/app/api/v1`, space-scoped when a space is set).
    pub fn core(&self) -> CoreApi {
        CoreApi::new(self.endpoint(&self.space_segments(&["app", "api", "v1"])))
    }

    /// Task engine API (`/app/api/v2`).
    pub fn task(&self) -> TaskApi {
        TaskApi::new(self.endpoint(&["app", "api", "v2"]))
    }

    /// Discussions API (`/app/discussions/api/v1`, space-scoped when a
    /// space is set).
    pub fn discussions(&self) -> DiscussionsApi {
        DiscussionsApi::new(self.endpoint(&self.space_segments(&[
            "app",
            "discussions",
            "api",
            "v1",
        ])))
    }

    /// File hub API (`/app/api/v1`).
    pub fn filehub(&self) -> FilehubApi {
        FilehubApi::new(self.endpoint(&["app", "api", "v1"]))
    }

    /// Integrator API (`/app/integrator/api`).
    pub fn integrator(&self) -> IntegratorApi {
        IntegratorApi::new(self.endpoint(&["app", "integrator", "api"]))
    }

    /// Agent API: `/app/api/v1` on the agent server itself, or routed
    /// through the core proxy (`/{space}/app/components/agent/app/api/v1`)
    /// when a space is set.
    pub fn agent(&self) -> AgentApi {
        let segments = match &self.inner.space {
            Some(space) => vec![
                space.as_str(),
                "app",
                "components",
                "agent",
                "app",
                "api",
                "v1",
            ],
            None => vec!["app", "api", "v1"],
        };
        AgentApi::new(self.endpoint(&segments))
    }

    fn space_segments<'a>(&'a self, rest: &[&'a str]) -> Vec<&'a str> {
        let mut segments = Vec::with_capacity(rest.len() + 1);
        if let Some(space) = &self.inner.space {
            segments.push(space.as_str());
        }
        segments.extend_from_slice(rest);
        segments
    }

    fn endpoint(&self, segments: &[&str]) -> Endpoint {
        Endpoint::new(self.clone(), join_segments(&self.inner.server, segments))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generic HTTP verbs
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request to an absolute URL with the client's headers and
    /// policy.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        query: &Query,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        let request = self.request(method, url, query).with_body(body);
        self.inner
            .transport
            .execute(&request, &self.inner.policy)
            .await
    }

    /// Stream a GET response to a file.
    pub async fn download(&self, url: Url, query: &Query, destination: &Path) -> Result<Response> {
        let request = self.request(Method::GET, url, query);
        self.inner
            .transport
            .download(&request, &self.inner.policy, destination)
            .await
    }

    fn request(&self, method: Method, url: Url, query: &Query) -> Request {
        Request::new(method, url)
            .with_query(query.clone())
            .with_headers(self.inner.headers.clone())
    }
}

impl std::fmt::Debug for KineticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KineticClient")
            .field("server", &self.inner.server.as_str())
            .field("space", &self.inner.space)
            .field("credentials", &self.inner.credentials)
            .finish()
    }
}

/// Append path segments (percent-encoded) to a base URL.
fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

// ─────────────────────────────────────────────────────────────────────────────
// Endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// A component's API base plus the client that reaches it.
///
/// Resource APIs address paths as segment lists; each segment is
/// percent-encoded on its own, so slugs and names containing `/`, spaces or
/// `::` are safe.
#[derive(Clone, Debug)]
pub struct Endpoint {
    client: KineticClient,
    base: Url,
}

impl Endpoint {
    pub(crate) fn new(client: KineticClient, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn client(&self) -> &KineticClient {
        &self.client
    }

    /// Full URL for a path below the API base.
    pub fn url(&self, segments: &[&str]) -> Url {
        join_segments(&self.base, segments)
    }

    pub async fn get(&self, segments: &[&str], query: &Query) -> Result<Response> {
        self.client
            .send(Method::GET, self.url(segments), query, RequestBody::Empty)
            .await
    }

    pub async fn head(&self, segments: &[&str], query: &Query) -> Result<Response> {
        self.client
            .send(Method::HEAD, self.url(segments), query, RequestBody::Empty)
            .await
    }

    pub async fn post(&self, segments: &[&str], body: impl Into<RequestBody>) -> Result<Response> {
        self.post_with_query(segments, &Query::new(), body).await
    }

    pub async fn post_with_query(
        &self,
        segments: &[&str],
        query: &Query,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        self.client
            .send(Method::POST, self.url(segments), query, body)
            .await
    }

    pub async fn put(&self, segments: &[&str], body: impl Into<RequestBody>) -> Result<Response> {
        self.put_with_query(segments, &Query::new(), body).await
    }

    pub async fn put_with_query(
        &self,
        segments: &[&str],
        query: &Query,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        self.client
            .send(Method::PUT, self.url(segments), query, body)
            .await
    }

    pub async fn patch(&self, segments: &[&str], body: impl Into<RequestBody>) -> Result<Response> {
        self.client
            .send(Method::PATCH, self.url(segments), &Query::new(), body)
            .await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<Response> {
        self.client
            .send(
                Method::DELETE,
                self.url(segments),
                &Query::new(),
                RequestBody::Empty,
            )
            .await
    }

    /// multipart/form-data POST.
    pub async fn post_multipart(
        &self,
        segments: &[&str],
        query: &Query,
        fields: Vec<FormField>,
    ) -> Result<Response> {
        self.client
            .send(
                Method::POST,
                self.url(segments),
                query,
                RequestBody::Multipart(fields),
            )
            .await
    }

    pub async fn download(
        &self,
        segments: &[&str],
        query: &Query,
        destination: &Path,
    ) -> Result<Response> {
        self.client
            .download(self.url(segments), query, destination)
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a [`KineticClient`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    server: Option<String>,
    space: Option<String>,
    username: Option<String>,
    password: Option<String>,
    bearer_token: Option<String>,
    options: SdkOptions,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server URL (e.g. `https://kinetic.example.com/kinetic`).
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.server = Some(url.into());
        self
    }

    /// Set the space slug.
    pub fn space(mut self, slug: impl Into<String>) -> Self {
        self.space = Some(slug.into());
        self
    }

    /// Authenticate with HTTP Basic credentials.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Authenticate with a bearer token.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Replace the whole options bag.
    pub fn options(mut self, options: SdkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_redirects(mut self, limit: i32) -> Self {
        self.options.max_redirects = limit;
        self
    }

    pub fn gateway_retry_limit(mut self, limit: i32) -> Self {
        self.options.gateway_retry_limit = limit;
        self
    }

    pub fn gateway_retry_delay(mut self, seconds: f64) -> Self {
        self.options.gateway_retry_delay = seconds;
        self
    }

    pub fn export_directory(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.options.export_directory = Some(path.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<KineticClient> {
        let server = self
            .server
            .ok_or_else(|| Error::Config("server is required".to_string()))?;

        let mut server = Url::parse(server.trim_end_matches('/'))?;
        if server.cannot_be_a_base() {
            return Err(Error::Config(format!("server '{}' is not a base URL", server)));
        }
        if server.path() == "/" {
            server.set_path("");
        }

        let credentials = match (self.username, self.password, self.bearer_token) {
            (Some(_), _, Some(_)) => {
                return Err(Error::Config(
                    "username/password and bearer token are mutually exclusive".to_string(),
                ));
            }
            (Some(username), password, None) => Credentials::Basic {
                username,
                password: password.unwrap_or_default(),
            },
            (None, _, Some(token)) => Credentials::Bearer { token },
            (None, _, None) => Credentials::None,
        };

        crate::logging::init(&self.options);

        if self.options.ssl_verify_mode == SslVerifyMode::None
            && self.options.ssl_ca_file.is_some()
        {
            tracing::warn!("ssl_ca_file is set but ssl_verify_mode is 'none'; peers are not verified");
        }

        let headers = auth::default_headers(&credentials)?;
        let transport = HttpTransport::new(&self.options)?;
        let policy = Policy::from_options(&self.options);

        tracing::debug!(server = %server, space = ?self.space, "Kinetic client created");

        Ok(KineticClient {
            inner: Arc::new(ClientInner {
                transport,
                server,
                space: self.space,
                credentials,
                headers,
                options: self.options,
                policy,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(space: Option<&str>) -> KineticClient {
        let mut builder = ClientBuilder::new().server("http://localhost:8080/kinetic/");
        if let Some(space) = space {
            builder = builder.space(space);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_builder_requires_server() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_conflicting_credentials() {
        let result = ClientBuilder::new()
            .server("http://localhost:8080")
            .basic_auth("admin", "pw")
            .bearer_token("tok")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = ClientBuilder::new().server("not a url").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_server_normalized() {
        let client = client(None);
        assert_eq!(client.server().as_str(), "http://localhost:8080/kinetic");

        let root = ClientBuilder::new()
            .server("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(
            root.core().endpoint().base_url().as_str(),
            "http://localhost:8080/app/api/v1"
        );
    }

    #[test]
    fn test_component_bases() {
        let client = client(None);
        assert_eq!(
            client.core().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/app/api/v1"
        );
        assert_eq!(
            client.task().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/app/api/v2"
        );
        assert_eq!(
            client.discussions().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/app/discussions/api/v1"
        );
        assert_eq!(
            client.integrator().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/app/integrator/api"
        );
        assert_eq!(
            client.agent().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/app/api/v1"
        );
    }

    #[test]
    fn test_space_scoped_bases() {
        let client = client(Some("acme"));
        assert_eq!(
            client.core().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/acme/app/api/v1"
        );
        assert_eq!(
            client.discussions().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/acme/app/discussions/api/v1"
        );
        assert_eq!(
            client.agent().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/acme/app/components/agent/app/api/v1"
        );
        // Task is never space-scoped
        assert_eq!(
            client.task().endpoint().base_url().as_str(),
            "http://localhost:8080/kinetic/app/api/v2"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let client = client(None);
        let url = client
            .task()
            .endpoint()
            .url(&["trees", "Kinetic Request CE :: Services :: Submitted"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/kinetic/app/api/v2/trees/Kinetic%20Request%20CE%20::%20Services%20::%20Submitted"
        );

        let url = client.core().endpoint().url(&["kapps", "a/b"]);
        assert_eq!(url.as_str(), "http://localhost:8080/kinetic/app/api/v1/kapps/a%2Fb");
    }

    #[test]
    fn test_with_policy_keeps_connection_settings() {
        let client = client(Some("acme"));
        let strict = client.with_policy(Policy::default().with_max_redirects(0));
        assert_eq!(strict.space(), Some("acme"));
        assert_eq!(strict.policy().max_redirects, crate::http::Budget::Remaining(0));
        assert_eq!(client.policy().max_redirects, crate::http::Budget::Remaining(5));
    }

    #[test]
    fn test_from_connection() {
        let connection = ResolvedConnection {
            server: "https://kinetic.example.com".to_string(),
            space: Some("acme".to_string()),
            credentials: Credentials::Bearer {
                token: "tok".to_string(),
            },
            options: SdkOptions {
                max_redirects: 1,
                ..Default::default()
            },
        };
        let client = KineticClient::from_connection(&connection).unwrap();
        assert_eq!(client.space(), Some("acme"));
        assert_eq!(client.options().max_redirects, 1);
        assert!(matches!(client.credentials(), Credentials::Bearer { .. }));
    }
}
