//! Discussions API.

use std::path::PathBuf;

use serde_json::{Value, json};

use crate::api::collection::Collection;
use crate::client::Endpoint;
use crate::content::MessageContent;
use crate::error::Result;
use crate::http::{FormField, Query, RequestBody, Response};

/// Discussions API client.
#[derive(Clone, Debug)]
pub struct DiscussionsApi {
    endpoint: Endpoint,
}

impl DiscussionsApi {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn collection(&self) -> Collection {
        Collection::new(self.endpoint.clone(), &["discussions"])
    }

    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.collection().list(query).await
    }

    pub async fn get(&self, id: &str, query: &Query) -> Result<Response> {
        self.collection().get(id, query).await
    }

    pub async fn create(&self, body: impl Into<RequestBody>) -> Result<Response> {
        self.collection().create(body).await
    }

    pub async fn update(&self, id: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.collection().update(id, body).await
    }

    pub async fn delete(&self, id: &str) -> Result<Response> {
        self.collection().delete(id).await
    }

    pub fn messages(&self, discussion_id: &str) -> MessagesApi {
        MessagesApi {
            endpoint: self.endpoint.clone(),
            discussion_id: discussion_id.to_string(),
        }
    }

    pub fn invitations(&self, discussion_id: &str) -> InvitationsApi {
        InvitationsApi {
            endpoint: self.endpoint.clone(),
            discussion_id: discussion_id.to_string(),
        }
    }

    /// Participants of a discussion, addressed by username.
    pub fn participants(&self, discussion_id: &str) -> Collection {
        self.collection().nested(discussion_id, &["participants"])
    }

    pub fn related_items(&self, discussion_id: &str) -> RelatedItemsApi {
        RelatedItemsApi {
            endpoint: self.endpoint.clone(),
            discussion_id: discussion_id.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Messages of one discussion.
#[derive(Clone, Debug)]
pub struct MessagesApi {
    endpoint: Endpoint,
    discussion_id: String,
}

impl MessagesApi {
    fn segments<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["discussions", self.discussion_id.as_str(), "messages"];
        segments.extend_from_slice(extra);
        segments
    }

    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&self.segments(&[]), query).await
    }

    pub async fn get(&self, message_id: &str, query: &Query) -> Result<Response> {
        self.endpoint.get(&self.segments(&[message_id]), query).await
    }

    /// Post a message. Text, token lists and structured tokens are all
    /// accepted.
    pub async fn add(&self, content: impl Into<MessageContent>) -> Result<Response> {
        self.endpoint
            .post(&self.segments(&[]), content.into().into_body())
            .await
    }

    /// Post a message with file attachments as multipart form data.
    pub async fn add_with_attachments(
        &self,
        content: impl Into<MessageContent>,
        attachments: &[PathBuf],
    ) -> Result<Response> {
        let tokens = Value::Array(content.into().into_tokens());
        let mut fields = vec![FormField::text("content", serde_json::to_string(&tokens)?)];
        fields.extend(
            attachments
                .iter()
                .map(|path| FormField::file("attachments", path.clone())),
        );
        self.endpoint
            .post_multipart(&self.segments(&[]), &Query::new(), fields)
            .await
    }

    pub async fn update(
        &self,
        message_id: &str,
        content: impl Into<MessageContent>,
    ) -> Result<Response> {
        self.endpoint
            .put(&self.segments(&[message_id]), content.into().into_body())
            .await
    }

    pub async fn delete(&self, message_id: &str) -> Result<Response> {
        self.endpoint.delete(&self.segments(&[message_id])).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invitations
// ─────────────────────────────────────────────────────────────────────────────

/// Invitations to one discussion.
///
/// Invitations are addressed by the invitee: an email address or a
/// username.
#[derive(Clone, Debug)]
pub struct InvitationsApi {
    endpoint: Endpoint,
    discussion_id: String,
}

impl InvitationsApi {
    fn segments<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["discussions", self.discussion_id.as_str(), "invitations"];
        segments.extend_from_slice(extra);
        segments
    }

    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&self.segments(&[]), query).await
    }

    /// Invite someone by email, with an optional personal message.
    pub async fn invite_email(&self, email: &str, message: Option<&str>) -> Result<Response> {
        let mut body = json!({ "email": email });
        if let Some(message) = message {
            body["message"] = json!(message);
        }
        self.endpoint.post(&self.segments(&[]), body).await
    }

    /// Invite an existing user.
    pub async fn invite_user(&self, username: &str) -> Result<Response> {
        self.endpoint
            .post(&self.segments(&[]), json!({ "user": { "username": username } }))
            .await
    }

    pub async fn resend(&self, invitee: &str) -> Result<Response> {
        self.endpoint
            .put(&self.segments(&[invitee]), RequestBody::Empty)
            .await
    }

    pub async fn delete(&self, invitee: &str) -> Result<Response> {
        self.endpoint.delete(&self.segments(&[invitee])).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Related items
// ─────────────────────────────────────────────────────────────────────────────

/// Items linked to one discussion, each identified by `(type, key)`.
#[derive(Clone, Debug)]
pub struct RelatedItemsApi {
    endpoint: Endpoint,
    discussion_id: String,
}

impl RelatedItemsApi {
    fn segments<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["discussions", self.discussion_id.as_str(), "relatedItems"];
        segments.extend_from_slice(extra);
        segments
    }

    pub async fn list(&self, query: &Query) -> Result<Response> {
        self.endpoint.get(&self.segments(&[]), query).await
    }

    pub async fn add(&self, item_type: &str, key: &str) -> Result<Response> {
        self.endpoint
            .post(&self.segments(&[]), json!({ "type": item_type, "key": key }))
            .await
    }

    pub async fn delete(&self, item_type: &str, key: &str) -> Result<Response> {
        self.endpoint.delete(&self.segments(&[item_type, key])).await
    }
}

#[cfg(test)]
mod tests {
    use crate::KineticClient;

    #[test]
    fn test_nested_paths() {
        let discussions = KineticClient::builder()
            .server("http://localhost:8080")
            .build()
            .unwrap()
            .discussions();
        assert_eq!(
            discussions.participants("d-1").url().path(),
            "/app/discussions/api/v1/discussions/d-1/participants"
        );
    }
}
