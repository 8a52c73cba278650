//! Conversation state: transcript, collected answers, and the current field.

use ayu_api::{AudioClip, FieldDescriptor, Report};
use std::collections::BTreeMap;

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Presentation tag for a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Text,
    /// Rendered as the consultation fee card with a pay action
    Payment,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub kind: MessageKind,
    pub is_error: bool,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            kind: MessageKind::Text,
            is_error: false,
            timestamp: now_millis(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: MessageKind::Text,
            is_error: false,
            timestamp: now_millis(),
        }
    }

    /// Create an error-flagged assistant message
    pub fn assistant_error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(content)
        }
    }

    /// Create a payment-tagged assistant message
    pub fn payment_prompt(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Payment,
            ..Self::assistant(content)
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Derived conversation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStatus {
    Active,
    Complete,
    Error,
}

/// Final handoff payload published once the completion delay elapses
#[derive(Debug, Clone)]
pub struct Completion {
    /// The report exactly as the backend returned it
    pub report: Report,
    /// Collected answers up to and including the last answered field
    pub collected: BTreeMap<String, String>,
}

/// State of one intake conversation
#[derive(Debug, Default)]
pub struct Conversation {
    /// Ordered transcript; append-only except for full resets
    pub messages: Vec<Message>,
    /// Answers accumulated so far, keyed by backend-assigned field key
    pub collected: BTreeMap<String, String>,
    /// What the UI must solicit next; `None` before the first response
    pub current_field: Option<FieldDescriptor>,
    /// Most recent speech clip, kept for the replay affordance
    pub speech: Option<AudioClip>,
    /// Whether an exchange is currently in flight
    pub in_flight: bool,
    /// Error banner text (transport or boundary failures)
    pub banner: Option<String>,
    /// Set once the completion handoff has been published
    pub completion: Option<Completion>,
}

impl Conversation {
    /// Derived status: complete once the handoff is published, error while
    /// the latest exchange failed, active otherwise.
    pub fn status(&self) -> ConversationStatus {
        if self.completion.is_some() {
            ConversationStatus::Complete
        } else if self.banner.is_some() || self.messages.last().is_some_and(|m| m.is_error) {
            ConversationStatus::Error
        } else {
            ConversationStatus::Active
        }
    }

    /// Clear everything back to a fresh conversation
    pub fn reset(&mut self) {
        *self = Conversation::default();
    }
}
