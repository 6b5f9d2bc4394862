//! Message and part model for chat conversations
//!
//! A conversation is an ordered list of [`Message`]s; each message carries an
//! ordered list of [`Part`]s whose insertion order is the display order. A
//! user message is fully formed at submission time. A streaming assistant
//! message is mutable: its single text part is the live append target.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of a message sender
///
/// `System` and `Data` turns are never rendered but may carry metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A turn authored by the person chatting
    User,
    /// A turn produced by the model
    Assistant,
    /// Instructional metadata turn
    System,
    /// Auxiliary data turn
    Data,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// Kind of content carried by a single [`Part`]
///
/// The wire field is named `type` and defaults to `text` when absent,
/// matching what the backend emits for plain text parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    /// Literal text content
    #[default]
    Text,
    /// Image media reference
    Image,
    /// Video media reference
    Video,
    /// Audio media reference
    Audio,
    /// Document media reference (PDFs, text files, office formats)
    Document,
    /// Anything that does not classify
    Other,
}

impl PartKind {
    /// Classify a MIME type into a part kind by its major component
    ///
    /// # Examples
    ///
    /// ```
    /// use chatwire::session::PartKind;
    ///
    /// assert_eq!(PartKind::from_mime("image/png"), PartKind::Image);
    /// assert_eq!(PartKind::from_mime("application/pdf"), PartKind::Document);
    /// ```
    pub fn from_mime(mime: &str) -> Self {
        let major = mime.split('/').next().unwrap_or(mime);
        match major {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "text" | "application" => Self::Document,
            _ => Self::Other,
        }
    }
}

/// One unit of message content
///
/// For `text` parts the `text` field holds the literal content (possibly an
/// empty string, growing by appends while streaming). For media parts it
/// holds the durable URL, and `mime_type` carries the concrete content type
/// used to pick a rendering affordance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Text content or durable media URL
    pub text: String,
    /// Content kind; wire name `type`
    #[serde(rename = "type", default)]
    pub kind: PartKind,
    /// Concrete content type for media parts
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Part {
    /// Creates a text part
    ///
    /// # Examples
    ///
    /// ```
    /// use chatwire::session::{Part, PartKind};
    ///
    /// let part = Part::text("hello");
    /// assert_eq!(part.kind, PartKind::Text);
    /// ```
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            kind: PartKind::Text,
            mime_type: None,
        }
    }

    /// Creates an immutable media part holding a durable URL
    pub fn media(kind: PartKind, url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            text: url.into(),
            kind,
            mime_type: Some(mime_type.into()),
        }
    }

    /// Returns true when this part is the streaming append target kind
    pub fn is_text(&self) -> bool {
        self.kind == PartKind::Text
    }
}

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique identifier; client-assigned for optimistic turns,
    /// server-assigned for persisted history
    pub id: String,
    /// Role of the sender
    pub role: Role,
    /// Ordered content parts; insertion order is display order
    pub parts: Vec<Part>,
}

impl Message {
    /// Creates a user message with the given parts and a fresh id
    ///
    /// # Examples
    ///
    /// ```
    /// use chatwire::session::{Message, Part, Role};
    ///
    /// let msg = Message::user(vec![Part::text("hi")]);
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.id.starts_with("user-"));
    /// ```
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            id: generate_id("user"),
            role: Role::User,
            parts,
        }
    }

    /// Creates an empty assistant placeholder keyed by `id`
    ///
    /// The placeholder carries exactly one empty text part, which becomes
    /// the live append target for incoming stream fragments.
    pub fn assistant_placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts: vec![Part::text("")],
        }
    }

    /// Creates an assistant message with initial text content
    pub fn assistant_with_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts: vec![Part::text(text)],
        }
    }

    /// Creates a message with an explicit id, role, and parts
    ///
    /// Used when mapping persisted history rows into the message model.
    pub fn with_id(id: impl Into<String>, role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: id.into(),
            role,
            parts,
        }
    }

    /// Concatenated text of all text-kind parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| p.is_text())
            .map(|p| p.text.as_str())
            .collect()
    }
}

/// Generate a prefixed, unique client-side message id
///
/// # Examples
///
/// ```
/// use chatwire::session::generate_id;
///
/// let id = generate_id("assistant");
/// assert!(id.starts_with("assistant-"));
/// ```
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
