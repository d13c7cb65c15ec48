//! Generic REST collection.
//!
//! Most platform resources are a plain collection: list, fetch one member,
//! create, update, delete. [`Collection`] covers that shape once; component
//! façades hand out collections rooted at the right path.

use serde_json::Value;
use url::Url;

use crate::client::Endpoint;
use crate::error::{Error, Result};
use crate::http::{Query, RequestBody, Response};

/// Upper bound on pages fetched by [`Collection::list_all`].
const MAX_PAGES: usize = 1000;

/// A REST collection below a component endpoint.
#[derive(Clone, Debug)]
pub struct Collection {
    endpoint: Endpoint,
    path: Vec<String>,
}

impl Collection {
    pub(crate) fn new(endpoint: Endpoint, path: &[&str]) -> Self {
        Self {
            endpoint,
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn segments<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        self.path
            .iter()
            .map(String::as_str)
            .chain(extra.iter().copied())
            .collect()
    }

    /// URL of the collection itself.
    pub fn url(&self) -> Url {
        self.endpoint.url(&self.segments(&[]))
    }

    /// A nested collection below one member, e.g.
    /// `filestores/{slug}/access-keys`.
    pub fn nested(&self, id: &str, sub: &[&str]) -> Collection {
        let mut path = self.path.clone();
        path.push(id.to_string());
        path.extend(sub.iter().map(|s| s.to_string()));
        Collection {
            endpoint: self.endpoint.clone(),
            path,
        }
    }

    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&self.segments(&[]), query).await
    }

    pub async fn get(&self, id: &str, query: &Query) -> Result<Response> {
        self.endpoint.get(&self.segments(&[id]), query).await
    }

    pub async fn create(&self, body: impl Into<RequestBody>) -> Result<Response> {
        self.endpoint.post(&self.segments(&[]), body).await
    }

    pub async fn update(&self, id: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.endpoint.put(&self.segments(&[id]), body).await
    }

    pub async fn delete(&self, id: &str) -> Result<Response> {
        self.endpoint.delete(&self.segments(&[id])).await
    }

    /// Fetch every page of a paginated listing and collect the array found
    /// under `items_key`.
    ///
    /// Follows `nextPageToken` until the server stops returning one. Any
    /// non-2xx page is an error.
    pub async fn list_all(&self, query: &Query, items_key: &str) -> Result<Vec<Value>> {
        collect_pages(&self.endpoint, &self.segments(&[]), query, items_key).await
    }
}

/// Follow `nextPageToken` across pages of a listing.
pub(crate) async fn collect_pages(
    endpoint: &Endpoint,
    segments: &[&str],
    query: &Query,
    items_key: &str,
) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    for page in 1..=MAX_PAGES {
        let page_query = match &token {
            Some(token) => query.clone().page_token(token.clone()),
            None => query.clone(),
        };
        let response = endpoint.get(segments, &page_query).await?.ensure_success()?;
        let content = response.content().ok_or_else(|| Error::Api {
            status: response.status(),
            message: "listing response is not JSON".to_string(),
        })?;

        if let Some(page_items) = content.get(items_key).and_then(Value::as_array) {
            items.extend(page_items.iter().cloned());
        }

        token = content
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        tracing::debug!(page, items = items.len(), more = token.is_some(), "Fetched listing page");
        if token.is_none() {
            break;
        }
    }

    Ok(items)
}
