//! Live discussion feed over WebSocket.

use std::ops::ControlFlow;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, USER_AGENT};
use url::Url;

use crate::api::DiscussionsApi;
use crate::auth;
use crate::error::{Error, Result};

/// Interval between keep-alive pings.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// An event pushed by the discussions server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiscussionEvent {
    /// Event name, e.g. `subscribed`, `message:create`, `unsubscribed`.
    pub event: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl DiscussionEvent {
    /// Whether the server ended the subscription with this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event.as_str(), "unsubscribed" | "closed")
    }
}

/// Frames sent to the server.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientFrame<'a> {
    Subscribe { topic: &'a str },
    Unsubscribe { topic: &'a str },
}

impl DiscussionsApi {
    /// Subscribe to a discussion and deliver events to `on_event` until
    /// the server ends the subscription, the socket closes, or the callback
    /// returns [`ControlFlow::Break`].
    ///
    /// Terminal events are delivered before returning.
    pub async fn subscribe<F>(&self, discussion_id: &str, mut on_event: F) -> Result<()>
    where
        F: FnMut(&DiscussionEvent) -> ControlFlow<()>,
    {
        let url = socket_url(self.endpoint().base_url())?;
        let topic = format!("discussions/discussion/{}", discussion_id);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static(auth::USER_AGENT_VALUE));
        if let Some(value) = auth::authorization(self.endpoint().client().credentials()) {
            let value = HeaderValue::from_str(&value)
                .map_err(|_| Error::Config("credentials contain invalid header characters".into()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        tracing::info!(url = %url, topic = %topic, "Connecting to discussion feed");
        let (socket, _) = connect_async(request)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        let (sink, mut stream) = socket.split();

        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        let writer = tokio::spawn(write_loop(sink, rx));
        let _ = tx.send(frame(&ClientFrame::Subscribe { topic: &topic })?);

        let outcome = loop {
            let Some(msg) = stream.next().await else {
                tracing::info!("Discussion feed ended");
                break Ok(());
            };
            match msg {
                Ok(Message::Text(text)) => {
                    let event = match serde_json::from_str::<DiscussionEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse discussion event: {} - {}", e, text);
                            continue;
                        }
                    };
                    tracing::debug!(event = %event.event, "Discussion event");

                    let terminal = event.is_terminal();
                    let stop = on_event(&event).is_break();
                    if terminal {
                        break Ok(());
                    }
                    if stop {
                        let _ = tx.send(frame(&ClientFrame::Unsubscribe { topic: &topic })?);
                        break Ok(());
                    }
                }
                Ok(Message::Ping(data)) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed discussion feed");
                    break Ok(());
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!("Unexpected binary message");
                }
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break Err(Error::WebSocket(e.to_string()));
                }
            }
        };

        // Closing the channel makes the writer send Close and exit
        drop(tx);
        let _ = writer.await;
        outcome
    }
}

/// Owns the write half: forwards queued frames and keeps the socket alive
/// with pings until the channel closes.
async fn write_loop<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<Message>)
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let start = tokio::time::Instant::now() + PING_INTERVAL;
    let mut ping = tokio::time::interval_at(start, PING_INTERVAL);

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                };
                if let Err(e) = sink.send(msg).await {
                    tracing::debug!("Failed to send frame: {}", e);
                    return;
                }
            }
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    tracing::debug!("Failed to send ping: {}", e);
                    return;
                }
            }
        }
    }
}

fn frame(frame: &ClientFrame<'_>) -> Result<Message> {
    Ok(Message::Text(serde_json::to_string(frame)?.into()))
}

/// Feed URL for a discussions API base: `.../app/discussions/api/v1`
/// becomes `ws(s)://.../app/discussions/socket`.
pub fn socket_url(base: &Url) -> Result<Url> {
    let mut url = base.clone();
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::Config(format!("Unsupported URL scheme: {}", other)));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::Config("Failed to set scheme".to_string()))?;

    if let Ok(mut path) = url.path_segments_mut() {
        path.pop().pop().push("socket");
    }
    url.set_query(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url() {
        let base = Url::parse("http://localhost:8080/kinetic/acme/app/discussions/api/v1").unwrap();
        assert_eq!(
            socket_url(&base).unwrap().as_str(),
            "ws://localhost:8080/kinetic/acme/app/discussions/socket"
        );

        let base = Url::parse("https://example.com/app/discussions/api/v1").unwrap();
        assert_eq!(
            socket_url(&base).unwrap().as_str(),
            "wss://example.com/app/discussions/socket"
        );
    }

    #[test]
    fn test_client_frame_shape() {
        let json = serde_json::to_value(ClientFrame::Subscribe { topic: "t" }).unwrap();
        assert_eq!(json, serde_json::json!({"action": "subscribe", "topic": "t"}));
    }

    #[test]
    fn test_terminal_events() {
        let event: DiscussionEvent =
            serde_json::from_str(r#"{"event":"unsubscribed","topic":"t"}"#).unwrap();
        assert!(event.is_terminal());
        let event: DiscussionEvent = serde_json::from_str(r#"{"event":"message:create"}"#).unwrap();
        assert!(!event.is_terminal());
        assert_eq!(event.data, Value::Null);
    }
}
