//! Request description handed to the transport.

use std::path::PathBuf;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered query parameters.
///
/// Values are form-encoded when appended to the URL. Order is preserved and
/// repeated keys are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// `include=` expansion list (e.g. `"details,attributes"`).
    pub fn include(self, include: impl Into<String>) -> Self {
        self.param("include", include.into())
    }

    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit)
    }

    pub fn page_token(self, token: impl Into<String>) -> Self {
        self.param("pageToken", token.into())
    }

    /// Search expression (`q=`).
    pub fn q(self, expression: impl Into<String>) -> Self {
        self.param("q", expression.into())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append the parameters to a URL's query string.
    pub fn apply(&self, url: &mut Url) {
        if self.params.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &self.params {
            pairs.append_pair(key, value);
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Query::new(), |query, (k, v)| query.param(k, v))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Body
// ─────────────────────────────────────────────────────────────────────────────

/// A multipart field value.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    /// Read from disk when the request is sent; MIME type guessed from the
    /// file extension.
    File(PathBuf),
    Bytes {
        file_name: String,
        data: Bytes,
        content_type: Option<String>,
    },
}

/// A named multipart field.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::File(path.into()),
        }
    }

    pub fn bytes(name: impl Into<String>, file_name: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Bytes {
                file_name: file_name.into(),
                data,
                content_type: None,
            },
        }
    }
}

/// Request body.
///
/// Text is sent verbatim; structured JSON is serialized right before
/// transmission, so a mapping and the same mapping pre-serialized by the
/// caller produce identical bytes.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    Multipart(Vec<FormField>),
}

impl RequestBody {
    /// Serialize any `Serialize` value as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    /// The textual wire form, for non-multipart bodies.
    pub fn to_text(&self) -> Result<Option<String>> {
        match self {
            RequestBody::Empty | RequestBody::Multipart(_) => Ok(None),
            RequestBody::Text(text) => Ok(Some(text.clone())),
            RequestBody::Json(value) => Ok(Some(serde_json::to_string(value)?)),
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<&Value> for RequestBody {
    fn from(value: &Value) -> Self {
        RequestBody::Json(value.clone())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<FormField>> for RequestBody {
    fn from(fields: Vec<FormField>) -> Self {
        RequestBody::Multipart(fields)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// One logical HTTP operation.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub query: Query,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Query::default(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// The target URL with the query string applied.
    pub fn target(&self) -> Url {
        let mut url = self.url.clone();
        self.query.apply(&mut url);
        url
    }
}
