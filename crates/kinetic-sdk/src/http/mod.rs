//! HTTP transport shared by every component.
//!
//! One [`HttpTransport`] performs one logical operation per call: it sends
//! the request, follows redirects within the redirect budget, retries
//! 502/503/504 within the gateway budget, and hands back a [`Response`].
//! Ordinary 4xx/5xx statuses are responses, not errors.

mod multipart;
mod policy;
mod request;
mod response;

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use tokio::io::AsyncWriteExt;
use url::Url;

use kinetic_config::{SdkOptions, SslVerifyMode};

use crate::error::{Error, Result};

pub use multipart::{DEFAULT_MIME_TYPE, mime_type_for, mime_type_from_extension};
pub use policy::{Budget, Policy};
pub use request::{FieldValue, FormField, Query, Request, RequestBody};
pub use response::Response;

/// Timeout for establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a whole buffered request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of the redirect/retry loop before the body is read.
enum Dispatched {
    /// An HTTP answer, body still unread, and the URL that produced it.
    Answer(reqwest::Response, Url),
    /// No HTTP answer could be obtained.
    Failed(Response),
}

/// Budgets left for one logical operation, shared by every dispatch it
/// makes.
#[derive(Debug, Clone, Copy)]
struct Allowance {
    redirects: Budget,
    retries: Budget,
    attempts: u32,
    waited: Duration,
}

impl Allowance {
    fn new(policy: &Policy) -> Self {
        Self {
            redirects: policy.max_redirects,
            retries: policy.gateway_retry_limit,
            attempts: 0,
            waited: Duration::ZERO,
        }
    }
}

/// Redirect-following, gateway-retrying HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport honoring the TLS settings in `options`.
    ///
    /// Redirects are never followed by reqwest itself, and idle connections
    /// are not kept: every attempt (and every redirect hop) opens a fresh
    /// connection.
    pub fn new(options: &SdkOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .connect_timeout(CONNECT_TIMEOUT);

        match options.ssl_verify_mode {
            SslVerifyMode::None => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            SslVerifyMode::Peer => {}
        }

        if let Some(ca_file) = &options.ssl_ca_file {
            let pem = std::fs::read(ca_file).map_err(|e| {
                Error::Config(format!(
                    "cannot read ssl_ca_file '{}': {}",
                    ca_file.display(),
                    e
                ))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem)?;
            builder = builder.add_root_certificate(certificate);
        }

        Ok(Self {
            http: builder.build()?,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Perform a request and read the whole response.
    pub async fn execute(&self, request: &Request, policy: &Policy) -> Result<Response> {
        let mut allowance = Allowance::new(policy);
        match self
            .dispatch(request, request.target(), policy, Some(self.timeout), &mut allowance)
            .await?
        {
            Dispatched::Answer(response, _) => Ok(Response::read(response).await),
            Dispatched::Failed(response) => Ok(response),
        }
    }

    /// Stream a GET response body to `destination` chunk by chunk.
    ///
    /// Redirects are resolved up front with HEAD requests. Nothing is written
    /// unless the final status is 2xx. The returned response carries status
    /// and headers only.
    pub async fn download(
        &self,
        request: &Request,
        policy: &Policy,
        destination: &Path,
    ) -> Result<Response> {
        // HEAD and GET draw on one set of budgets
        let mut allowance = Allowance::new(policy);
        let mut head = request.clone();
        head.method = Method::HEAD;
        head.body = RequestBody::Empty;

        let target = match self
            .dispatch(&head, request.target(), policy, Some(self.timeout), &mut allowance)
            .await?
        {
            Dispatched::Answer(_, url) => url,
            Dispatched::Failed(response) => return Ok(response),
        };

        let mut get = request.clone();
        get.method = Method::GET;
        let response = match self.dispatch(&get, target, policy, None, &mut allowance).await? {
            Dispatched::Answer(response, _) => response,
            Dispatched::Failed(response) => return Ok(response),
        };

        if !response.status().is_success() {
            return Ok(Response::read(response).await);
        }

        let summary = Response::head_only(&response);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(
                        path = %destination.display(),
                        written,
                        error = %e,
                        "Download interrupted"
                    );
                    return Ok(Response::failed(e.to_string()));
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(path = %destination.display(), bytes = written, "Download complete");
        Ok(summary)
    }

    /// The redirect/retry loop.
    ///
    /// Budgets come from the operation's [`Allowance`] and are decremented
    /// per hop; the loop ends on any status that is neither a redirect nor a
    /// gateway error, or when a budget is exhausted.
    async fn dispatch(
        &self,
        request: &Request,
        mut url: Url,
        policy: &Policy,
        timeout: Option<Duration>,
        allowance: &mut Allowance,
    ) -> Result<Dispatched> {
        let Allowance {
            redirects,
            retries,
            attempts,
            waited,
        } = allowance;

        loop {
            *attempts += 1;
            tracing::debug!(method = %request.method, url = %url, attempt = *attempts, "Sending request");

            let builder = self.build(request, url.clone(), timeout).await?;
            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(method = %request.method, url = %url, error = %e, "Request failed without a response");
                    return Ok(Dispatched::Failed(Response::failed(e.to_string())));
                }
            };
            let status = response.status();

            if status.is_redirection() {
                let next = match *redirects {
                    Budget::Passthrough => None,
                    Budget::Remaining(0) => {
                        return Err(Error::TooManyRedirects {
                            url: url.to_string(),
                        });
                    }
                    Budget::Remaining(n) => {
                        *redirects = Budget::Remaining(n - 1);
                        location(&response, &url)
                    }
                };
                if let Some(next) = next {
                    tracing::debug!(from = %url, to = %next, "Following redirect");
                    url = next;
                    continue;
                }
            } else if is_gateway_error(status) {
                match *retries {
                    Budget::Passthrough => {}
                    Budget::Remaining(0) => {
                        tracing::warn!(
                            url = %url,
                            status = status.as_u16(),
                            attempts = *attempts,
                            waited_ms = waited.as_millis() as u64,
                            "Gateway retries exhausted"
                        );
                        return Err(Error::GatewayRetriesExhausted {
                            status: status.as_u16(),
                            attempts: *attempts,
                        });
                    }
                    Budget::Remaining(n) => {
                        *retries = Budget::Remaining(n - 1);
                        tracing::warn!(
                            url = %url,
                            status = status.as_u16(),
                            retries_left = n - 1,
                            delay_ms = policy.gateway_retry_delay.as_millis() as u64,
                            "Gateway error, retrying"
                        );
                        tokio::time::sleep(policy.gateway_retry_delay).await;
                        *waited += policy.gateway_retry_delay;
                        continue;
                    }
                }
            }

            return Ok(Dispatched::Answer(response, url));
        }
    }

    async fn build(
        &self,
        request: &Request,
        url: Url,
        timeout: Option<Duration>,
    ) -> Result<reqwest::RequestBuilder> {
        let mut headers = request.headers.clone();
        if request.body.is_multipart() {
            // reqwest supplies the boundary-bearing content type
            headers.remove(CONTENT_TYPE);
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            RequestBody::Multipart(fields) => builder.multipart(multipart::build_form(fields).await?),
            body => match body.to_text()? {
                Some(text) => builder.body(text),
                None => builder,
            },
        };
        Ok(builder)
    }
}

fn is_gateway_error(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// The redirect target, resolved against the URL that issued it.
fn location(response: &reqwest::Response, current: &Url) -> Option<Url> {
    let value = response.headers().get(LOCATION)?.to_str().ok()?;
    match current.join(value) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(location = value, error = %e, "Ignoring unparseable redirect location");
            None
        }
    }
}
