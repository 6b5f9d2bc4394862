//! Streaming transport for the chat endpoint
//!
//! [`ChatTransport`] owns the HTTP client used for generation requests. It
//! opens exactly one streaming POST per call and hands the raw byte stream
//! back to the orchestrator, which drives the read loop and enforces
//! single-flight supersession through its cancellation tokens.

use crate::error::{ChatwireError, Result};
use crate::session::message::{Message, Part, Role};
use bytes::Bytes;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound generation request body
///
/// Wire shape: `{ "messages": [...], "chatId": string | null }`. Wire
/// messages carry only role and parts; client-side ids never leave the
/// process.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Prior turns plus the new user turn, in conversation order
    pub messages: Vec<WireMessage>,
    /// Chat the generation belongs to
    #[serde(rename = "chatId")]
    pub chat_id: Option<String>,
}

/// One message as serialized on the wire
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    /// Role of the sender
    pub role: Role,
    /// Ordered content parts
    pub parts: Vec<Part>,
}

impl ChatRequest {
    /// Build a request from conversation history
    ///
    /// # Examples
    ///
    /// ```
    /// use chatwire::session::{ChatRequest, Message, Part};
    ///
    /// let history = vec![Message::user(vec![Part::text("hi")])];
    /// let request = ChatRequest::new(&history, Some("c1"));
    /// assert_eq!(request.messages.len(), 1);
    /// assert_eq!(request.chat_id.as_deref(), Some("c1"));
    /// ```
    pub fn new(history: &[Message], chat_id: Option<&str>) -> Self {
        Self {
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    parts: m.parts.clone(),
                })
                .collect(),
            chat_id: chat_id.map(|id| id.to_string()),
        }
    }
}

/// Error body shape for non-success chat responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP transport for the streaming chat endpoint
pub struct ChatTransport {
    client: Client,
    base_url: String,
}

impl ChatTransport {
    /// Creates a transport targeting `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chatwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ChatwireError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Open one streaming generation exchange
    ///
    /// Issues `POST {base}/chat` with the bearer credential and returns the
    /// response body as a stream of byte chunks. The caller owns the read
    /// loop and its cancellation.
    ///
    /// # Errors
    ///
    /// Non-success statuses fail with [`ChatwireError::Transport`] carrying
    /// the backend's `detail` message when the body provides one.
    pub async fn open_stream(
        &self,
        request: &ChatRequest,
        bearer: &str,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>>> {
        let url = format!("{}/chat", self.base_url);
        tracing::debug!(
            "opening chat stream: {} messages, chat {:?}",
            request.messages.len(),
            request.chat_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("chat request failed: {}", e);
                ChatwireError::Transport(format!("chat request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| status.to_string())
                });
            tracing::error!("chat endpoint returned {}: {}", status, detail);
            return Err(ChatwireError::Transport(detail).into());
        }

        Ok(response.bytes_stream())
    }
}
