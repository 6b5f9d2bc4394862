//! Streaming chat session core
//!
//! This module contains the five facets of the session manager: the message
//! model, the line-delimited JSON stream decoder, the conversation reducer,
//! the streaming transport, the media upload coordinator, and the
//! orchestrator that ties them together.

pub mod conversation;
pub mod decoder;
pub mod manager;
pub mod media;
pub mod message;
pub mod transport;

pub use conversation::{Conversation, ConversationEvent};
pub use decoder::{LineDecoder, StreamLine};
pub use manager::{ChatSession, SessionPhase};
pub use media::{MediaAttachment, MediaUploader, UploadLimits};
pub use message::{generate_id, Message, Part, PartKind, Role};
pub use transport::{ChatRequest, ChatTransport, WireMessage};
