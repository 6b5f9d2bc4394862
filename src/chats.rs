//! Chat record CRUD and history loading
//!
//! Chat records live in the backend; the client only needs CRUD-shaped
//! calls returning identifiers, plus a history load that maps persisted
//! rows into the message/part model.

use crate::api::ApiClient;
use crate::error::Result;
use crate::session::message::{Message, Part, PartKind, Role};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One chat record as listed by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Chat identifier
    #[serde(rename = "chatId")]
    pub chat_id: String,
    /// Owning user
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Display title; absent until the first rename
    #[serde(default)]
    pub title: Option<String>,
    /// Creation time in epoch milliseconds
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

impl ChatRecord {
    /// Creation time as a UTC timestamp, when the epoch value is valid
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

/// Body for chat creation
#[derive(Debug, Serialize)]
struct CreateChatRequest<'a> {
    user_id: &'a str,
    title: Option<&'a str>,
}

/// Response for chat creation
#[derive(Debug, Deserialize)]
struct CreateChatResponse {
    chat_id: String,
}

/// Body for chat renames
#[derive(Debug, Serialize)]
struct RenameChatRequest<'a> {
    title: &'a str,
}

/// One persisted message row as returned by the history endpoint
#[derive(Debug, Deserialize)]
struct StoredMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(rename = "messageId")]
    message_id: String,
}

/// Backend client for chat records and persisted history
#[derive(Clone)]
pub struct ChatStore {
    api: ApiClient,
}

impl ChatStore {
    /// Creates a store over the backend `api` client
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// List the caller's chat records
    pub async fn list(&self) -> Result<Vec<ChatRecord>> {
        self.api.get_json("/api/chats").await
    }

    /// Create a chat record, returning its id
    pub async fn create(&self, user_id: &str, title: Option<&str>) -> Result<String> {
        let response: CreateChatResponse = self
            .api
            .post_json("/api/chats/create", &CreateChatRequest { user_id, title })
            .await?;
        tracing::debug!("created chat {}", response.chat_id);
        Ok(response.chat_id)
    }

    /// Rename a chat record
    pub async fn rename(&self, chat_id: &str, title: &str) -> Result<()> {
        self.api
            .patch_json(
                &format!("/api/chats/{}", chat_id),
                &RenameChatRequest { title },
            )
            .await
    }

    /// Delete a chat record
    pub async fn delete(&self, chat_id: &str) -> Result<()> {
        self.api.delete(&format!("/api/chats/{}", chat_id)).await
    }

    /// Load a chat's persisted history, mapped into the message model
    ///
    /// Each row contributes a text part from non-empty `content` (with
    /// literal `\n` escapes restored) and a media part from
    /// `media_url`/`media_type` when present.
    pub async fn load_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let rows: Vec<StoredMessage> = self
            .api
            .get_json(&format!("/api/chats/{}", chat_id))
            .await?;
        Ok(rows.into_iter().map(map_stored_message).collect())
    }
}

/// Map one persisted row into a [`Message`]
fn map_stored_message(row: StoredMessage) -> Message {
    let mut parts = Vec::new();

    if let Some(content) = row.content {
        if !content.trim().is_empty() {
            parts.push(Part::text(content.replace("\\n", "\n")));
        }
    }
    if let (Some(url), Some(media_type)) = (row.media_url, row.media_type) {
        parts.push(Part::media(
            PartKind::from_mime(&media_type),
            url,
            media_type,
        ));
    }

    Message::with_id(row.message_id, row.role, parts)
}
