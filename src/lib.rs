//! Chatwire - streaming chat session client library
//!
//! This library implements the client half of a streaming chat protocol:
//! submissions carry the conversation so far plus a new user turn, and the
//! reply arrives as newline-delimited JSON fragments that are assembled
//! incrementally into a growing assistant message, with cancellation,
//! supersession, and optimistic local state for the user's turn and any
//! attached media.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: the session core -- message model, stream decoder,
//!   conversation reducer, streaming transport, media uploads, and the
//!   orchestrator that drives one submission at a time
//! - `chats`: chat record CRUD and persisted history loading
//! - `api`: bearer-authorized JSON request helper for the backend
//! - `auth`: credential provider seam (static and env-backed)
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatwire::auth::StaticCredentials;
//! use chatwire::{ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let session = ChatSession::new(&config, Arc::new(StaticCredentials::new("token")))?;
//!     session.select_chat("c1");
//!     session.submit("hello", Vec::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod chats;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use chats::{ChatRecord, ChatStore};
pub use config::Config;
pub use error::{ChatwireError, Result};
pub use session::{
    ChatSession, Conversation, ConversationEvent, LineDecoder, MediaAttachment, Message, Part,
    PartKind, Role, SessionPhase, StreamLine,
};
