//! ayu-intake: Intake conversation runtime
//!
//! This crate drives one conversation between a patient and the remote
//! intake backend: the turn-by-turn state machine, the scripted demo
//! sequencer, and the capability seams (service, speech, clock) they run
//! against. Failures are never fatal to a conversation; they surface as
//! conversation state and events, not as bubbled-up errors.

pub mod clock;
pub mod events;
pub mod machine;
pub mod playback;
pub mod scenario;
pub mod sequencer;
pub mod service;
pub mod session;
pub mod transcript;

pub use clock::{Clock, TokioClock, VirtualClock};
pub use events::IntakeEvent;
pub use machine::IntakeMachine;
pub use playback::{NullPlayer, PlaybackError, SpeechPlayer};
pub use scenario::{Referral, Scenario, ScriptLine, builtin_scenarios};
pub use sequencer::{DemoEvent, Phase, ScriptedSequencer};
pub use service::{HttpIntakeService, IntakeService, SpeechSynth};
pub use session::{Language, PatientSession};
pub use transcript::{Completion, Conversation, ConversationStatus, Message, MessageKind, Role};
