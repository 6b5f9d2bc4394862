//! Conversation state and the incremental message reducer
//!
//! The conversation is the ordered message list for one chat, exclusively
//! owned by the session orchestrator. All mutation flows through
//! [`Conversation::apply`] as a sequence of [`ConversationEvent`]s; the
//! transport and decoder only emit data, never touch state directly.

use crate::session::message::{Message, Part};

/// One state transition for the conversation list
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    /// Append a fully formed user turn
    UserMessageAppended(Message),
    /// Append an empty assistant placeholder keyed by `id`
    AssistantPlaceholderCreated {
        /// Pre-allocated id of the assistant message under generation
        id: String,
    },
    /// Append streamed text to the assistant message with `id`
    AssistantFragmentReceived {
        /// Target assistant message id
        id: String,
        /// Fragment text, appended strictly in arrival order
        text: String,
    },
    /// Replace the whole list; used when switching or loading a chat
    MessagesReplaced(Vec<Message>),
}

/// Ordered message list for one chat
///
/// Fragments for a given assistant id must be applied in arrival order; the
/// resulting text is the concatenation of every fragment delivered for that
/// id, regardless of fragment boundaries.
///
/// # Examples
///
/// ```
/// use chatwire::session::{Conversation, ConversationEvent};
///
/// let mut conversation = Conversation::new();
/// conversation.apply(ConversationEvent::AssistantPlaceholderCreated {
///     id: "assistant-1".to_string(),
/// });
/// conversation.apply(ConversationEvent::AssistantFragmentReceived {
///     id: "assistant-1".to_string(),
///     text: "Hel".to_string(),
/// });
/// conversation.apply(ConversationEvent::AssistantFragmentReceived {
///     id: "assistant-1".to_string(),
///     text: "lo".to_string(),
/// });
/// assert_eq!(conversation.message("assistant-1").unwrap().text(), "Hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation seeded with persisted history
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// The ordered message list
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the conversation holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Look up a message by id
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Apply one event to the list
    pub fn apply(&mut self, event: ConversationEvent) {
        match event {
            ConversationEvent::UserMessageAppended(message) => {
                self.messages.push(message);
            }
            ConversationEvent::AssistantPlaceholderCreated { id } => {
                self.messages.push(Message::assistant_placeholder(id));
            }
            ConversationEvent::AssistantFragmentReceived { id, text } => {
                self.append_fragment(&id, text);
            }
            ConversationEvent::MessagesReplaced(messages) => {
                self.messages = messages;
            }
        }
    }

    /// Append `text` to the live text part of the assistant message `id`
    ///
    /// If no message with that id exists (fragments normally follow their
    /// placeholder) a new assistant message is created with the fragment as
    /// its initial content, keeping at most one assistant message per
    /// generated id.
    fn append_fragment(&mut self, id: &str, text: String) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            if let Some(part) = message.parts.iter_mut().find(|p| p.is_text()) {
                part.text.push_str(&text);
            } else {
                message.parts.push(Part::text(text));
            }
        } else {
            tracing::debug!("fragment for unknown assistant id {}, creating message", id);
            self.messages.push(Message::assistant_with_text(id, text));
        }
    }

    /// Remove every message whose id is in `ids`, returning the removed count
    ///
    /// This is the single rollback operation for a failed submission: the
    /// orchestrator records the ids it appended optimistically and reverts
    /// them in one call instead of filtering at each failure site.
    pub fn rollback(&mut self, ids: &[String]) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !ids.iter().any(|id| *id == m.id));
        before - self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::{PartKind, Role};

    fn fragment(id: &str, text: &str) -> ConversationEvent {
        ConversationEvent::AssistantFragmentReceived {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_user_message_appends_to_end() {
        let mut conversation = Conversation::new();
        conversation.apply(ConversationEvent::UserMessageAppended(Message::user(vec![
            Part::text("hi"),
        ])));
        conversation.apply(ConversationEvent::UserMessageAppended(Message::user(vec![
            Part::text("again"),
        ])));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[1].text(), "again");
    }

    #[test]
    fn test_placeholder_has_empty_text_part() {
        let mut conversation = Conversation::new();
        conversation.apply(ConversationEvent::AssistantPlaceholderCreated {
            id: "assistant-1".to_string(),
        });
        let message = conversation.message("assistant-1").unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.parts[0].text, "");
    }

    #[test]
    fn test_fragments_concatenate_in_delivery_order() {
        let mut conversation = Conversation::new();
        conversation.apply(ConversationEvent::AssistantPlaceholderCreated {
            id: "assistant-1".to_string(),
        });
        for piece in ["Hel", "lo, ", "world"] {
            conversation.apply(fragment("assistant-1", piece));
        }
        assert_eq!(
            conversation.message("assistant-1").unwrap().text(),
            "Hello, world"
        );
        // Still a single message with a single text part.
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].parts.len(), 1);
    }

    #[test]
    fn test_fragment_for_unknown_id_creates_message() {
        let mut conversation = Conversation::new();
        conversation.apply(fragment("assistant-9", "orphan"));
        let message = conversation.message("assistant-9").unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "orphan");

        // Follow-up fragments land on the same message.
        conversation.apply(fragment("assistant-9", " text"));
        assert_eq!(conversation.message("assistant-9").unwrap().text(), "orphan text");
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_fragment_appends_to_text_part_not_media() {
        let mut conversation = Conversation::new();
        conversation.apply(ConversationEvent::UserMessageAppended(Message::with_id(
            "assistant-1",
            Role::Assistant,
            vec![Part::media(PartKind::Image, "https://x/y.png", "image/png")],
        )));
        conversation.apply(fragment("assistant-1", "caption"));
        let message = conversation.message("assistant-1").unwrap();
        assert_eq!(message.parts.len(), 2);
        assert_eq!(message.parts[0].text, "https://x/y.png");
        assert_eq!(message.text(), "caption");
    }

    #[test]
    fn test_messages_replaced_is_wholesale() {
        let mut conversation = Conversation::new();
        conversation.apply(ConversationEvent::UserMessageAppended(Message::user(vec![
            Part::text("old"),
        ])));
        conversation.apply(ConversationEvent::MessagesReplaced(vec![
            Message::with_id("m1", Role::User, vec![Part::text("persisted")]),
        ]));
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].id, "m1");
    }

    #[test]
    fn test_rollback_removes_recorded_ids() {
        let mut conversation = Conversation::new();
        let user = Message::user(vec![Part::text("hi")]);
        let user_id = user.id.clone();
        conversation.apply(ConversationEvent::UserMessageAppended(user));
        conversation.apply(ConversationEvent::AssistantPlaceholderCreated {
            id: "assistant-1".to_string(),
        });

        let removed = conversation.rollback(&[user_id, "assistant-1".to_string()]);
        assert_eq!(removed, 2);
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_rollback_ignores_unknown_ids() {
        let mut conversation = Conversation::new();
        conversation.apply(ConversationEvent::UserMessageAppended(Message::user(vec![
            Part::text("hi"),
        ])));
        let removed = conversation.rollback(&["missing".to_string()]);
        assert_eq!(removed, 0);
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_from_messages_seeds_history() {
        let conversation = Conversation::from_messages(vec![Message::with_id(
            "m1",
            Role::Assistant,
            vec![Part::text("hello")],
        )]);
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_empty());
    }
}
