//! Session orchestration for streaming chat
//!
//! [`ChatSession`] owns the conversation for the active chat and drives each
//! submission through an explicit state machine:
//!
//! ```text
//! Idle -> UploadingMedia (files only) -> Submitting -> Streaming -> Idle
//! ```
//!
//! Exactly one stream session may be live at a time. Starting a new
//! submission (or switching chats) cancels the previous session's token
//! before the new exchange opens, and a cancelled session never applies
//! another fragment. The conversation list is mutated only here, through
//! reducer events; the decoder and transport just emit data.

use crate::auth::CredentialProvider;
use crate::chats::ChatStore;
use crate::config::Config;
use crate::error::{ChatwireError, Result};
use crate::session::conversation::{Conversation, ConversationEvent};
use crate::session::decoder::{LineDecoder, StreamLine};
use crate::session::media::{MediaAttachment, MediaUploader, UploadLimits};
use crate::session::message::{generate_id, Message, Part, Role};
use crate::session::transport::{ChatRequest, ChatTransport};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Phase of the active submission, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No submission in flight
    Idle,
    /// Attached files are being uploaded
    UploadingMedia,
    /// Optimistic turns are being appended and the exchange is opening
    Submitting,
    /// Reply fragments are arriving
    Streaming,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::UploadingMedia => write!(f, "UPLOADING"),
            Self::Submitting => write!(f, "SUBMITTING"),
            Self::Streaming => write!(f, "STREAMING"),
        }
    }
}

/// Live state of one outstanding generation request
///
/// Created at submission time, discarded when the stream settles; never
/// reused. The token is shared with the upload batch and the read loop so
/// both observe the same cancellation.
#[derive(Debug, Clone)]
struct StreamSession {
    token: CancellationToken,
    generation: u64,
    assistant_id: String,
}

/// Ids appended optimistically by one submission attempt
///
/// Recorded up front so a failed attempt reverts through a single rollback
/// call instead of ad hoc filtering at each failure site.
struct SubmissionTxn {
    user_id: String,
    assistant_id: String,
}

impl SubmissionTxn {
    fn new(user_id: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            assistant_id: assistant_id.into(),
        }
    }

    fn ids(&self) -> Vec<String> {
        vec![self.user_id.clone(), self.assistant_id.clone()]
    }
}

/// State guarded by the session lock
struct SessionInner {
    conversation: Conversation,
    phase: SessionPhase,
    chat_id: Option<String>,
}

/// Streaming chat session manager
///
/// Cheaply cloneable; clones share the same conversation and single-flight
/// state, so a clone can cancel or supersede a stream started elsewhere.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatwire::auth::StaticCredentials;
/// use chatwire::config::Config;
/// use chatwire::session::ChatSession;
///
/// # async fn example() -> chatwire::error::Result<()> {
/// let config = Config::default();
/// let session = ChatSession::new(&config, Arc::new(StaticCredentials::new("token")))?;
/// session.select_chat("c1");
/// session.submit("hi", Vec::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatSession {
    transport: Arc<ChatTransport>,
    uploader: Arc<MediaUploader>,
    store: Arc<ChatStore>,
    credentials: Arc<dyn CredentialProvider>,
    inner: Arc<Mutex<SessionInner>>,
    // NOTE: std::sync::Mutex -- these locks are never held across .await.
    active: Arc<Mutex<Option<StreamSession>>>,
    generations: Arc<AtomicU64>,
}

impl ChatSession {
    /// Creates a session against the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if any HTTP client fails to initialize.
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let timeout = Duration::from_secs(config.backend.request_timeout_seconds);
        let api = crate::api::ApiClient::new(
            &config.backend.base_url,
            timeout,
            Arc::clone(&credentials),
        )?;
        let transport = ChatTransport::new(&config.backend.base_url, timeout)?;
        let uploader = MediaUploader::new(
            api.clone(),
            UploadLimits {
                max_attachments: config.uploads.max_attachments,
                max_file_bytes: config.uploads.max_file_bytes,
            },
            timeout,
        )?;
        let store = ChatStore::new(api);

        tracing::info!("initialized chat session: backend={}", config.backend.base_url);

        Ok(Self {
            transport: Arc::new(transport),
            uploader: Arc::new(uploader),
            store: Arc::new(store),
            credentials,
            inner: Arc::new(Mutex::new(SessionInner {
                conversation: Conversation::new(),
                phase: SessionPhase::Idle,
                chat_id: None,
            })),
            active: Arc::new(Mutex::new(None)),
            generations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// The chat record store backing this session
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Current submission phase
    pub fn phase(&self) -> SessionPhase {
        self.inner
            .lock()
            .map(|inner| inner.phase)
            .unwrap_or(SessionPhase::Idle)
    }

    /// Snapshot of the conversation message list
    pub fn messages(&self) -> Vec<Message> {
        self.inner
            .lock()
            .map(|inner| inner.conversation.messages().to_vec())
            .unwrap_or_default()
    }

    /// Id of the selected chat, if any
    pub fn chat_id(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.chat_id.clone())
    }

    /// Select a chat and start from an empty conversation
    ///
    /// Cancels any in-flight stream. Use [`open_chat`](Self::open_chat) to
    /// also load the chat's persisted history.
    pub fn select_chat(&self, chat_id: impl Into<String>) {
        self.cancel();
        if let Ok(mut inner) = self.inner.lock() {
            inner.chat_id = Some(chat_id.into());
            inner.conversation = Conversation::new();
        }
    }

    /// Select a chat and replace the conversation with its persisted history
    ///
    /// Any in-flight stream for the previous chat is cancelled first; state
    /// is never merged across chats.
    pub async fn open_chat(&self, chat_id: &str) -> Result<()> {
        self.cancel();
        let history = self.store.load_messages(chat_id).await?;
        tracing::debug!("loaded {} message(s) for chat {}", history.len(), chat_id);
        self.with_inner(|inner| {
            inner.chat_id = Some(chat_id.to_string());
            inner
                .conversation
                .apply(ConversationEvent::MessagesReplaced(history));
            inner.phase = SessionPhase::Idle;
        })
    }

    /// Cancel the in-flight stream, if any
    ///
    /// Cancellation is silent: it never surfaces as an error, and the
    /// partial assistant text received so far stays in the conversation.
    pub fn cancel(&self) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(session) = active.take() {
                tracing::debug!("cancelling stream session {}", session.generation);
                session.token.cancel();
            }
        }
        if let Ok(mut inner) = self.inner.lock() {
            inner.phase = SessionPhase::Idle;
        }
    }

    /// Submit one user turn with optional attachments
    ///
    /// A submission with neither text nor files is ignored. Any previous
    /// in-flight generation is superseded before the new exchange opens.
    ///
    /// Sequence: acquire credential, upload media (all-or-nothing), append
    /// the user turn and an assistant placeholder optimistically, open the
    /// stream, then apply fragments in arrival order until the stream ends,
    /// an upstream error line arrives, or the session is cancelled.
    ///
    /// # Errors
    ///
    /// - [`ChatwireError::Session`] when no chat is selected
    /// - [`ChatwireError::MissingCredentials`] before anything is appended
    /// - [`ChatwireError::Upload`] after rolling back the optimistic turns
    /// - [`ChatwireError::Transport`] with the optimistic turns retained
    /// - [`ChatwireError::Upstream`] with partial assistant text retained
    ///
    /// Cancellation and supersession resolve to `Ok(())`.
    pub async fn submit(&self, text: &str, attachments: Vec<MediaAttachment>) -> Result<()> {
        if text.trim().is_empty() && attachments.is_empty() {
            tracing::debug!("ignoring submission with no text and no files");
            return Ok(());
        }
        let chat_id = self
            .chat_id()
            .ok_or_else(|| ChatwireError::Session("no chat selected".to_string()))?;

        let session = self.begin_stream()?;
        let txn = SubmissionTxn::new(generate_id("user"), session.assistant_id.clone());

        // Credential first: a failure here leaves the conversation untouched.
        let bearer = match self.credentials.bearer_token().await {
            Ok(token) => token,
            Err(err) => {
                self.settle(&session);
                return Err(err);
            }
        };

        let mut parts: Vec<Part> = Vec::new();
        if !attachments.is_empty() {
            self.set_phase(&session, SessionPhase::UploadingMedia)?;
            match self.uploader.upload_all(&attachments, &session.token).await {
                Ok(uploaded) => parts.extend(uploaded),
                Err(err) => {
                    self.rollback(&txn)?;
                    self.settle(&session);
                    if session.token.is_cancelled() {
                        tracing::debug!("submission cancelled during media upload");
                        return Ok(());
                    }
                    return Err(err);
                }
            }
        }
        if !text.trim().is_empty() {
            parts.push(Part::text(text));
        }

        self.set_phase(&session, SessionPhase::Submitting)?;

        // Snapshot before the optimistic appends: the request carries prior
        // turns plus the new user turn, never the placeholder.
        let history = self.messages();
        let user_message = Message::with_id(&txn.user_id, Role::User, parts);
        let request = {
            let mut turns = history;
            turns.push(user_message.clone());
            ChatRequest::new(&turns, Some(&chat_id))
        };

        let appended = self
            .apply_if_live(&session, ConversationEvent::UserMessageAppended(user_message))?
            && self.apply_if_live(
                &session,
                ConversationEvent::AssistantPlaceholderCreated {
                    id: session.assistant_id.clone(),
                },
            )?;
        if !appended {
            self.settle(&session);
            return Ok(());
        }

        let stream = match self.transport.open_stream(&request, &bearer).await {
            Ok(stream) => stream,
            Err(err) => {
                self.settle(&session);
                if session.token.is_cancelled() {
                    return Ok(());
                }
                // The optimistic turns stay visible on a failed exchange.
                return Err(err);
            }
        };

        self.set_phase(&session, SessionPhase::Streaming)?;
        let outcome = self.drive_stream(&session, stream).await;
        self.settle(&session);
        outcome
    }

    /// Read the reply stream, decoding lines and applying fragments
    async fn drive_stream(
        &self,
        session: &StreamSession,
        stream: impl Stream<Item = reqwest::Result<Bytes>>,
    ) -> Result<()> {
        tokio::pin!(stream);
        let mut decoder = LineDecoder::new();

        while let Some(chunk) = stream.next().await {
            // Cooperative cancellation: checked once per received chunk.
            if session.token.is_cancelled() {
                tracing::debug!(
                    "stream session {} superseded; stopping read loop",
                    session.generation
                );
                return Ok(());
            }

            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    if session.token.is_cancelled() {
                        // An abort of a superseded request is not an error.
                        return Ok(());
                    }
                    return Err(
                        ChatwireError::Transport(format!("stream read failed: {}", err)).into(),
                    );
                }
            };

            for line in decoder.feed(&chunk) {
                match line {
                    StreamLine::Fragment(text) => {
                        self.apply_if_live(
                            session,
                            ConversationEvent::AssistantFragmentReceived {
                                id: session.assistant_id.clone(),
                                text,
                            },
                        )?;
                    }
                    StreamLine::Failure(message) => {
                        // Terminal for this stream; text accumulated so far stays.
                        tracing::error!("upstream stream error: {}", message);
                        return Err(ChatwireError::Upstream(message).into());
                    }
                }
            }
        }

        decoder.finish();
        Ok(())
    }

    /// Create a fresh stream session, cancelling any previous one first
    fn begin_stream(&self) -> Result<StreamSession> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| ChatwireError::Session("stream registry lock poisoned".to_string()))?;
        if let Some(previous) = active.take() {
            tracing::debug!("superseding stream session {}", previous.generation);
            previous.token.cancel();
        }

        let session = StreamSession {
            token: CancellationToken::new(),
            generation: self.generations.fetch_add(1, Ordering::SeqCst) + 1,
            assistant_id: generate_id("assistant"),
        };
        *active = Some(session.clone());
        Ok(session)
    }

    /// Apply a reducer event unless the session has been cancelled
    ///
    /// The cancellation check happens under the state lock, so a cancelled
    /// session can never interleave an apply after the check.
    fn apply_if_live(&self, session: &StreamSession, event: ConversationEvent) -> Result<bool> {
        self.with_inner(|inner| {
            if session.token.is_cancelled() {
                return false;
            }
            inner.conversation.apply(event);
            true
        })
    }

    /// Revert the optimistic turns of one submission attempt
    fn rollback(&self, txn: &SubmissionTxn) -> Result<()> {
        self.with_inner(|inner| {
            let removed = inner.conversation.rollback(&txn.ids());
            if removed > 0 {
                tracing::debug!("rolled back {} optimistic message(s)", removed);
            }
        })
    }

    /// Set the phase unless the session has been superseded
    fn set_phase(&self, session: &StreamSession, phase: SessionPhase) -> Result<()> {
        self.with_inner(|inner| {
            if !session.token.is_cancelled() {
                inner.phase = phase;
            }
        })
    }

    /// Release the active slot and return the phase to idle
    ///
    /// A superseded session skips the phase reset: the superseding
    /// submission owns the phase now.
    fn settle(&self, session: &StreamSession) {
        if let Ok(mut active) = self.active.lock() {
            if active.as_ref().map(|a| a.generation) == Some(session.generation) {
                *active = None;
            }
        }
        if !session.token.is_cancelled() {
            if let Ok(mut inner) = self.inner.lock() {
                inner.phase = SessionPhase::Idle;
            }
        }
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut SessionInner) -> T) -> Result<T> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ChatwireError::Session("session state lock poisoned".to_string()))?;
        Ok(f(&mut inner))
    }
}
