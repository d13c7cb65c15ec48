//! Response wrapper returned by every SDK call.

use std::borrow::Cow;
use std::sync::OnceLock;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// A completed HTTP exchange.
///
/// Built once per finished attempt and never mutated afterwards. The JSON
/// content is parsed lazily on first access; a body that isn't JSON simply
/// has no content.
///
/// A response with status `0` is a *failed* response: no HTTP answer was
/// received (connection refused, reset, TLS failure) and [`message`]
/// carries the transport error.
///
/// [`message`]: Response::message
#[derive(Debug)]
pub struct Response {
    status: u16,
    message: String,
    headers: HeaderMap,
    body: Bytes,
    content: OnceLock<Option<Value>>,
}

impl Response {
    pub fn new(status: u16, message: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            message: message.into(),
            headers,
            body,
            content: OnceLock::new(),
        }
    }

    /// A response standing in for an exchange that produced no HTTP answer.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(0, message, HeaderMap::new(), Bytes::new())
    }

    /// Read a reqwest response fully into memory.
    pub(crate) async fn read(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let message = status.canonical_reason().unwrap_or_default().to_string();
        match response.bytes().await {
            Ok(body) => Self::new(status.as_u16(), message, headers, body),
            Err(e) => {
                tracing::warn!(status = status.as_u16(), error = %e, "Failed to read response body");
                Self::failed(e.to_string())
            }
        }
    }

    /// Status and headers of a response whose body was consumed elsewhere.
    pub(crate) fn head_only(response: &reqwest::Response) -> Self {
        let status = response.status();
        Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            response.headers().clone(),
            Bytes::new(),
        )
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status reason phrase, or the transport error for failed responses.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8 (lossy).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parsed JSON content, or `None` if the body is empty or not JSON.
    pub fn content(&self) -> Option<&Value> {
        self.content
            .get_or_init(|| serde_json::from_slice(&self.body).ok())
            .as_ref()
    }

    /// Deserialize the body into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `true` when no HTTP answer was received.
    pub fn is_failed(&self) -> bool {
        self.status == 0
    }

    /// Escalate a non-2xx response into [`Error::Api`].
    ///
    /// The message prefers the server's JSON `error`/`message` field and
    /// falls back to the status message.
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .content()
            .and_then(|c| c.get("error").or_else(|| c.get("message")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.message.clone());
        Err(Error::Api {
            status: self.status,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> Response {
        Response::new(status, "", HeaderMap::new(), Bytes::from(body.to_string()))
    }

    #[test]
    fn test_lazy_json_content() {
        let r = response(200, r#"{"kapps":[{"slug":"services"}]}"#);
        assert_eq!(r.content().unwrap()["kapps"][0]["slug"], "services");
        // Second access hits the cached parse
        assert!(r.content().is_some());
    }

    #[test]
    fn test_non_json_body_has_no_content() {
        let r = response(200, "<tree/>");
        assert!(r.content().is_none());
        assert_eq!(r.text(), "<tree/>");
        assert!(r.json::<Value>().is_err());
    }

    #[test]
    fn test_failed_response_shape() {
        let r = Response::failed("connection refused");
        assert!(r.is_failed());
        assert!(!r.is_success());
        assert_eq!(r.status(), 0);
        assert_eq!(r.message(), "connection refused");
        assert!(r.body().is_empty());
    }

    #[test]
    fn test_ensure_success_uses_server_error() {
        let r = response(400, r#"{"error":"Slug is required"}"#);
        match r.ensure_success() {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Slug is required");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }

        let ok = response(201, "{}").ensure_success().unwrap();
        assert_eq!(ok.status(), 201);
    }

    #[test]
    fn test_typed_json() {
        #[derive(serde::Deserialize)]
        struct Space {
            slug: String,
        }
        let r = response(200, &json!({"slug": "acme"}).to_string());
        let space: Space = r.json().unwrap();
        assert_eq!(space.slug, "acme");
    }
}
