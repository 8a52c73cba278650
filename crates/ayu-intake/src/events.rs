//! Events emitted by the intake machine

use crate::transcript::{Completion, Message};
use ayu_api::FieldDescriptor;

/// Events emitted while a conversation runs. The UI repaints from these
/// instead of polling machine internals.
#[derive(Debug, Clone)]
pub enum IntakeEvent {
    /// An exchange request was issued
    ExchangeStart,

    /// A message was appended to the transcript
    MessageAppended { message: Message },

    /// The current field was replaced
    FieldChanged { field: FieldDescriptor },

    /// A new speech clip was stored (and playback attempted)
    SpeechReady,

    /// The exchange finished (successfully or not)
    ExchangeEnd,

    /// The completion handoff was published
    Completed { completion: Completion },

    /// An exchange failed; the banner carries this text
    Error { message: String },
}

impl IntakeEvent {
    /// Check if this is a terminal event for the conversation
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntakeEvent::Completed { .. })
    }
}
