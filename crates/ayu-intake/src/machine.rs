//! The intake state machine: drives exactly one conversation between a
//! patient and the remote intake backend, one exchange at a time.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use ayu_api::{AudioClip, ExchangeOutcome, ExchangeRequest, FieldDescriptor, FieldType};

use crate::clock::Clock;
use crate::events::IntakeEvent;
use crate::playback::SpeechPlayer;
use crate::service::IntakeService;
use crate::transcript::{Completion, Conversation, ConversationStatus, Message};

/// Delay between the completion signal and the report handoff
pub const NAVIGATION_DELAY: Duration = Duration::from_millis(3000);

/// Wire value submitted when the patient confirms payment
pub const PAYMENT_INPUT: &str = "Paid";

/// Transcript text for a confirmed payment
pub const PAYMENT_MESSAGE: &str = "Payment confirmed";

/// Banner text for transport failures
pub const CONNECTION_ERROR: &str = "Connection error. Please try again.";

/// Drives one conversation with the intake backend and decides what the
/// input surface should look like at every point.
pub struct IntakeMachine {
    conversation: Conversation,
    service: Arc<dyn IntakeService>,
    player: Arc<dyn SpeechPlayer>,
    clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<IntakeEvent>,
    /// Answers pre-filled before the conversation starts (e.g. language)
    seeds: BTreeMap<String, String>,
    /// Guards the automatic opening exchange against duplicate invocation
    started: bool,
    /// Set between the completion signal and the handoff
    completing: bool,
}

impl IntakeMachine {
    /// Create a new machine over the given capabilities
    pub fn new(
        service: Arc<dyn IntakeService>,
        player: Arc<dyn SpeechPlayer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            conversation: Conversation::default(),
            service,
            player,
            clock,
            event_tx,
            seeds: BTreeMap::new(),
            started: false,
            completing: false,
        }
    }

    /// Pre-fill a collected answer before the conversation starts
    pub fn with_seed(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        self.seeds.insert(key.clone(), value.clone());
        self.conversation.collected.insert(key, value);
        self
    }

    /// Subscribe to machine events
    pub fn subscribe(&self) -> broadcast::Receiver<IntakeEvent> {
        self.event_tx.subscribe()
    }

    /// Current conversation state
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The transcript so far
    pub fn messages(&self) -> &[Message] {
        &self.conversation.messages
    }

    /// Collected answers so far
    pub fn collected(&self) -> &BTreeMap<String, String> {
        &self.conversation.collected
    }

    /// The field the UI must solicit next
    pub fn current_field(&self) -> Option<&FieldDescriptor> {
        self.conversation.current_field.as_ref()
    }

    /// Whether an exchange is in flight (input controls render inert)
    pub fn is_waiting(&self) -> bool {
        self.conversation.in_flight
    }

    /// Derived conversation status
    pub fn status(&self) -> ConversationStatus {
        self.conversation.status()
    }

    /// The most recent speech clip, if any
    pub fn last_speech(&self) -> Option<&AudioClip> {
        self.conversation.speech.as_ref()
    }

    /// Replay the most recent speech clip
    pub async fn replay_speech(&self) {
        if let Some(clip) = self.conversation.speech.clone() {
            if let Err(e) = self.player.play(clip).await {
                tracing::debug!("speech replay skipped: {e}");
            }
        }
    }

    /// Issue the automatic opening exchange. Fires exactly once per
    /// conversation regardless of how many times it is called.
    pub async fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.run_exchange(String::new(), None).await;
    }

    /// Submit free text. Ignored for selection/payment fields, for
    /// empty/whitespace input, and while an exchange is in flight.
    pub async fn submit_text(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() || self.busy() {
            return;
        }
        if let Some(field) = &self.conversation.current_field {
            if !field.kind.accepts_free_text() {
                return;
            }
        }
        let last_key = self
            .conversation
            .current_field
            .as_ref()
            .map(|f| f.key.clone());
        self.append(Message::user(input));
        self.run_exchange(input.to_string(), last_key).await;
    }

    /// Select one of the current field's options
    pub async fn choose_option(&mut self, option: &str) {
        if self.busy() {
            return;
        }
        let Some(field) = &self.conversation.current_field else {
            return;
        };
        if !field.kind.is_selection() || !field.options.iter().any(|o| o == option) {
            return;
        }
        let key = field.key.clone();
        self.append(Message::user(option));
        self.run_exchange(option.to_string(), Some(key)).await;
    }

    /// Confirm payment for a payment-typed field
    pub async fn confirm_payment(&mut self) {
        if self.busy() {
            return;
        }
        let Some(field) = &self.conversation.current_field else {
            return;
        };
        if field.kind != FieldType::Payment {
            return;
        }
        let key = field.key.clone();
        self.append(Message::user(PAYMENT_MESSAGE));
        self.run_exchange(PAYMENT_INPUT.to_string(), Some(key)).await;
    }

    /// Restart the conversation from scratch, keeping seeded answers
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.conversation.collected = self.seeds.clone();
        self.started = false;
        self.completing = false;
    }

    fn busy(&self) -> bool {
        self.conversation.in_flight || self.completing || self.conversation.completion.is_some()
    }

    fn append(&mut self, message: Message) {
        let _ = self.event_tx.send(IntakeEvent::MessageAppended {
            message: message.clone(),
        });
        self.conversation.messages.push(message);
    }

    /// Store the clip for replay and fire playback. Playback failures
    /// degrade silently; the conversation continues without audio.
    async fn update_speech(&mut self, speech: Option<AudioClip>) {
        let Some(clip) = speech else {
            return;
        };
        self.conversation.speech = Some(clip.clone());
        let _ = self.event_tx.send(IntakeEvent::SpeechReady);
        if let Err(e) = self.player.play(clip).await {
            tracing::debug!("speech playback skipped: {e}");
        }
    }

    /// The one exchange round trip shared by every user action
    async fn run_exchange(&mut self, input: String, last_key: Option<String>) {
        self.conversation.in_flight = true;
        self.conversation.banner = None;
        let _ = self.event_tx.send(IntakeEvent::ExchangeStart);

        let request = ExchangeRequest {
            collected_data: self.conversation.collected.clone(),
            latest_input: input.clone(),
            last_field_key: last_key.clone(),
        };

        let result = self.service.exchange(request).await;
        self.conversation.in_flight = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                // The field and transcript stay untouched so the patient can
                // retry the same answer. Contract violations keep their
                // specific text; transport failures get the generic banner.
                tracing::warn!("exchange failed: {e}");
                let banner = if e.is_contract() {
                    e.to_string()
                } else {
                    CONNECTION_ERROR.to_string()
                };
                self.conversation.banner = Some(banner.clone());
                let _ = self.event_tx.send(IntakeEvent::Error { message: banner });
                let _ = self.event_tx.send(IntakeEvent::ExchangeEnd);
                return;
            }
        };

        match response.outcome {
            ExchangeOutcome::Rejected { message } => {
                // The answer was not accepted: no collected-data update, the
                // previously active field stays in place.
                self.append(Message::assistant_error(response.question));
                self.update_speech(response.speech).await;
                self.conversation.banner = Some(message.clone());
                let _ = self.event_tx.send(IntakeEvent::Error { message });
            }
            ExchangeOutcome::Ask(field) => {
                if let Some(key) = last_key {
                    self.conversation.collected.insert(key, input);
                }
                let message = if field.kind == FieldType::Payment {
                    Message::payment_prompt(response.question)
                } else {
                    Message::assistant(response.question)
                };
                self.append(message);
                self.update_speech(response.speech).await;
                self.conversation.current_field = Some(field.clone());
                let _ = self.event_tx.send(IntakeEvent::FieldChanged { field });
            }
            ExchangeOutcome::Complete(report) => {
                if let Some(key) = last_key {
                    self.conversation.collected.insert(key, input);
                }
                self.append(Message::assistant(response.question));
                self.update_speech(response.speech).await;

                // No further exchanges once completion is signaled; the
                // handoff is published after a fixed delay.
                self.completing = true;
                let _ = self.event_tx.send(IntakeEvent::ExchangeEnd);
                self.clock.sleep(NAVIGATION_DELAY).await;
                let completion = Completion {
                    report: *report,
                    collected: self.conversation.collected.clone(),
                };
                self.conversation.completion = Some(completion.clone());
                self.completing = false;
                let _ = self.event_tx.send(IntakeEvent::Completed { completion });
                return;
            }
        }

        let _ = self.event_tx.send(IntakeEvent::ExchangeEnd);
    }

    #[cfg(test)]
    fn force_in_flight(&mut self, in_flight: bool) {
        self.conversation.in_flight = in_flight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::playback::NullPlayer;
    use crate::transcript::{MessageKind, Role};
    use async_trait::async_trait;
    use ayu_api::{Error as ApiError, ExchangeResponse, Report};
    use parking_lot::Mutex;

    /// A scripted backend: pops one canned result per exchange and records
    /// every request it saw.
    struct MockService {
        responses: Mutex<Vec<ayu_api::Result<ExchangeResponse>>>,
        requests: Arc<Mutex<Vec<ExchangeRequest>>>,
    }

    impl MockService {
        fn new(responses: Vec<ayu_api::Result<ExchangeResponse>>) -> (Arc<Self>, Arc<Mutex<Vec<ExchangeRequest>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let service = Arc::new(Self {
                responses: Mutex::new(responses),
                requests: requests.clone(),
            });
            (service, requests)
        }
    }

    #[async_trait]
    impl IntakeService for MockService {
        async fn exchange(&self, request: ExchangeRequest) -> ayu_api::Result<ExchangeResponse> {
            self.requests.lock().push(request);
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                Ok(ask("done", FieldDescriptor::text("extra")))
            } else {
                responses.remove(0)
            }
        }
    }

    fn ask(question: &str, field: FieldDescriptor) -> ExchangeResponse {
        ExchangeResponse {
            question: question.to_string(),
            speech: None,
            outcome: ExchangeOutcome::Ask(field),
        }
    }

    fn rejected(question: &str, message: &str) -> ExchangeResponse {
        ExchangeResponse {
            question: question.to_string(),
            speech: None,
            outcome: ExchangeOutcome::Rejected {
                message: message.to_string(),
            },
        }
    }

    fn complete(question: &str, report: Report) -> ExchangeResponse {
        ExchangeResponse {
            question: question.to_string(),
            speech: None,
            outcome: ExchangeOutcome::Complete(Box::new(report)),
        }
    }

    fn make_machine(
        responses: Vec<ayu_api::Result<ExchangeResponse>>,
    ) -> (IntakeMachine, Arc<Mutex<Vec<ExchangeRequest>>>, Arc<VirtualClock>) {
        let (service, requests) = MockService::new(responses);
        let clock = VirtualClock::new();
        let machine = IntakeMachine::new(service, Arc::new(NullPlayer), clock.clone());
        (machine, requests, clock)
    }

    /// Poll `fut` to completion, advancing the virtual clock whenever it
    /// suspends on a sleep.
    async fn drive<T>(clock: &Arc<VirtualClock>, fut: impl Future<Output = T>) -> T {
        let mut fut = std::pin::pin!(fut);
        for _ in 0..1000 {
            if let std::task::Poll::Ready(value) = futures::poll!(&mut fut) {
                return value;
            }
            clock.advance(Duration::from_millis(500));
            tokio::task::yield_now().await;
        }
        panic!("future did not complete under the virtual clock");
    }

    #[tokio::test]
    async fn test_start_fires_exactly_once() {
        let (mut machine, requests, _clock) =
            make_machine(vec![Ok(ask("What is your name?", FieldDescriptor::text("name")))]);

        machine.start().await;
        machine.start().await;

        let requests = requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].latest_input, "");
        assert_eq!(requests[0].last_field_key, None);
    }

    #[tokio::test]
    async fn test_opening_exchange_appends_assistant_only() {
        let (mut machine, _requests, _clock) =
            make_machine(vec![Ok(ask("What is your name?", FieldDescriptor::text("name")))]);

        machine.start().await;

        assert_eq!(machine.messages().len(), 1);
        assert_eq!(machine.messages()[0].role, Role::Assistant);
        assert_eq!(machine.messages()[0].content, "What is your name?");
        assert_eq!(machine.current_field().unwrap().key, "name");
        assert_eq!(machine.status(), ConversationStatus::Active);
    }

    #[tokio::test]
    async fn test_text_answer_carries_key_and_commits() {
        let (mut machine, requests, _clock) = make_machine(vec![
            Ok(ask("What is your name?", FieldDescriptor::text("name"))),
            Ok(ask("How old are you?", FieldDescriptor::text("age"))),
        ]);

        machine.start().await;
        machine.submit_text("Asha").await;

        {
            let requests = requests.lock();
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[1].latest_input, "Asha");
            assert_eq!(requests[1].last_field_key.as_deref(), Some("name"));
        }
        assert_eq!(machine.collected().get("name").map(String::as_str), Some("Asha"));
        // Two exchanges: assistant, user, assistant
        assert_eq!(machine.messages().len(), 3);
        assert_eq!(machine.current_field().unwrap().key, "age");
    }

    #[tokio::test]
    async fn test_transcript_length_is_2n_minus_1() {
        let (mut machine, _requests, _clock) = make_machine(vec![
            Ok(ask("q1", FieldDescriptor::text("a"))),
            Ok(ask("q2", FieldDescriptor::text("b"))),
            Ok(ask("q3", FieldDescriptor::text("c"))),
        ]);

        machine.start().await;
        machine.submit_text("one").await;
        machine.submit_text("two").await;

        // 3 successful exchanges, the first without a preceding user message
        assert_eq!(machine.messages().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_and_whitespace_input_issue_nothing() {
        let (mut machine, requests, _clock) =
            make_machine(vec![Ok(ask("What is your name?", FieldDescriptor::text("name")))]);

        machine.start().await;
        machine.submit_text("").await;
        machine.submit_text("   \t ").await;

        assert_eq!(requests.lock().len(), 1);
        assert_eq!(machine.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_no_action_while_exchange_in_flight() {
        let (mut machine, requests, _clock) =
            make_machine(vec![Ok(ask("What is your name?", FieldDescriptor::text("name")))]);

        machine.start().await;
        machine.force_in_flight(true);
        machine.submit_text("Asha").await;
        machine.choose_option("Female").await;
        machine.confirm_payment().await;

        assert_eq!(requests.lock().len(), 1);
        assert_eq!(machine.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_option_selection_appends_and_submits() {
        let (mut machine, requests, _clock) = make_machine(vec![
            Ok(ask(
                "What is your gender?",
                FieldDescriptor::options("gender", vec!["Male".into(), "Female".into(), "Other".into()]),
            )),
            Ok(ask("Next question", FieldDescriptor::text("symptoms"))),
        ]);

        machine.start().await;
        machine.choose_option("Female").await;

        let requests = requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].latest_input, "Female");
        assert_eq!(requests[1].last_field_key.as_deref(), Some("gender"));
        assert_eq!(machine.messages()[1].role, Role::User);
        assert_eq!(machine.messages()[1].content, "Female");
        assert_eq!(machine.collected().get("gender").map(String::as_str), Some("Female"));
    }

    #[tokio::test]
    async fn test_selection_field_blocks_free_text_and_foreign_options() {
        let (mut machine, requests, _clock) = make_machine(vec![Ok(ask(
            "What is your gender?",
            FieldDescriptor::options("gender", vec!["Male".into(), "Female".into()]),
        ))]);

        machine.start().await;
        machine.submit_text("Female").await;
        machine.choose_option("Purple").await;

        assert_eq!(requests.lock().len(), 1);
        assert_eq!(machine.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_field_blocks_text_until_pay_action() {
        let (mut machine, requests, _clock) = make_machine(vec![
            Ok(ask("What is your name?", FieldDescriptor::text("name"))),
            Ok(ExchangeResponse {
                question: "Please complete the consultation fee payment.".into(),
                speech: None,
                outcome: ExchangeOutcome::Ask(FieldDescriptor::payment("consultation_fee")),
            }),
            Ok(ask("Payment received. What brings you in?", FieldDescriptor::text("symptoms"))),
        ]);

        machine.start().await;
        machine.submit_text("Asha").await;

        let payment_msg = machine.messages().last().unwrap();
        assert_eq!(payment_msg.kind, MessageKind::Payment);

        // Free text is inert while payment is pending
        machine.submit_text("can I skip this").await;
        assert_eq!(requests.lock().len(), 2);

        machine.confirm_payment().await;
        {
            let requests = requests.lock();
            assert_eq!(requests.len(), 3);
            assert_eq!(requests[2].latest_input, PAYMENT_INPUT);
            assert_eq!(requests[2].last_field_key.as_deref(), Some("consultation_fee"));
        }
        let user_msg = &machine.messages()[machine.messages().len() - 2];
        assert_eq!(user_msg.content, PAYMENT_MESSAGE);
        assert_eq!(
            machine.collected().get("consultation_fee").map(String::as_str),
            Some(PAYMENT_INPUT)
        );
    }

    #[tokio::test]
    async fn test_rejected_answer_keeps_field_and_collected() {
        let (mut machine, _requests, _clock) = make_machine(vec![
            Ok(ask("How old are you?", FieldDescriptor::text("age"))),
            Ok(rejected("How old are you?", "Please enter a valid age")),
            Ok(ask("What brings you in?", FieldDescriptor::text("symptoms"))),
        ]);

        machine.start().await;
        let collected_before = machine.collected().clone();
        machine.submit_text("banana").await;

        let error_msg = machine.messages().last().unwrap();
        assert_eq!(error_msg.role, Role::Assistant);
        assert!(error_msg.is_error);
        assert_eq!(error_msg.content, "How old are you?");
        assert_eq!(machine.collected(), &collected_before);
        assert_eq!(machine.current_field().unwrap().key, "age");
        assert_eq!(machine.status(), ConversationStatus::Error);
        assert_eq!(
            machine.conversation().banner.as_deref(),
            Some("Please enter a valid age")
        );

        // The conversation stays recoverable: the corrected answer goes
        // through against the same field.
        machine.submit_text("34").await;
        assert_eq!(machine.collected().get("age").map(String::as_str), Some("34"));
        assert_eq!(machine.status(), ConversationStatus::Active);
    }

    #[tokio::test]
    async fn test_transport_failure_sets_generic_banner_only() {
        let (mut machine, _requests, _clock) = make_machine(vec![
            Ok(ask("How old are you?", FieldDescriptor::text("age"))),
            Err(ApiError::Api {
                status: 502,
                message: "bad gateway".into(),
            }),
        ]);

        machine.start().await;
        machine.submit_text("34").await;

        // The user message was appended, but no assistant bubble for the
        // failed exchange; the field stays active for a retry.
        assert_eq!(machine.messages().len(), 2);
        assert_eq!(machine.messages()[1].role, Role::User);
        assert_eq!(machine.conversation().banner.as_deref(), Some(CONNECTION_ERROR));
        assert_eq!(machine.current_field().unwrap().key, "age");
        assert_eq!(machine.status(), ConversationStatus::Error);
        assert!(machine.collected().get("age").is_none());
    }

    #[tokio::test]
    async fn test_contract_failure_keeps_specific_banner() {
        let (mut machine, _requests, _clock) = make_machine(vec![
            Ok(ask("What is your name?", FieldDescriptor::text("name"))),
            Err(ApiError::UnknownFieldType("slider".into())),
        ]);

        machine.start().await;
        machine.submit_text("Asha").await;

        let banner = machine.conversation().banner.clone().unwrap();
        assert!(banner.contains("slider"), "got: {}", banner);
        assert_eq!(machine.current_field().unwrap().key, "name");
    }

    #[tokio::test]
    async fn test_banner_clears_on_next_exchange() {
        let (mut machine, _requests, _clock) = make_machine(vec![
            Ok(ask("How old are you?", FieldDescriptor::text("age"))),
            Err(ApiError::Api {
                status: 500,
                message: "oops".into(),
            }),
            Ok(ask("What brings you in?", FieldDescriptor::text("symptoms"))),
        ]);

        machine.start().await;
        machine.submit_text("34").await;
        assert!(machine.conversation().banner.is_some());

        machine.submit_text("34").await;
        assert!(machine.conversation().banner.is_none());
        assert_eq!(machine.collected().get("age").map(String::as_str), Some("34"));
    }

    #[tokio::test]
    async fn test_repeated_key_last_answer_wins() {
        let (mut machine, _requests, _clock) = make_machine(vec![
            Ok(ask("What is your name?", FieldDescriptor::text("name"))),
            Ok(ask("Confirm your name?", FieldDescriptor::text("name"))),
            Ok(ask("Anything else?", FieldDescriptor::text("notes"))),
        ]);

        machine.start().await;
        machine.submit_text("Asha").await;
        machine.submit_text("Asha Rao").await;

        assert_eq!(machine.collected().len(), 1);
        assert_eq!(
            machine.collected().get("name").map(String::as_str),
            Some("Asha Rao")
        );
    }

    #[tokio::test]
    async fn test_completion_hands_off_once_after_delay() {
        let report: Report = serde_json::from_value(serde_json::json!({
            "patient_data": { "name": "Asha" },
            "medical_analysis": { "patient_summary": "All clear." }
        }))
        .unwrap();
        let (mut machine, requests, clock) = make_machine(vec![
            Ok(ask("What is your name?", FieldDescriptor::text("name"))),
            Ok(complete("Thank you, your assessment is ready.", report)),
        ]);

        let mut events = machine.subscribe();
        machine.start().await;
        drive(&clock, machine.submit_text("Asha")).await;

        assert!(clock.elapsed() >= NAVIGATION_DELAY);
        let completion = machine.conversation().completion.as_ref().unwrap();
        assert_eq!(completion.report.patient_field("name").as_deref(), Some("Asha"));
        // The handoff includes the final answered field
        assert_eq!(
            completion.collected.get("name").map(String::as_str),
            Some("Asha")
        );
        assert_eq!(machine.status(), ConversationStatus::Complete);

        // Exactly one Completed event
        let mut completed = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, IntakeEvent::Completed { .. }) {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);

        // No further exchanges after completion
        machine.submit_text("hello?").await;
        assert_eq!(requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_seed_reaches_first_request_and_survives_reset() {
        let (service, requests) = MockService::new(vec![
            Ok(ask("q", FieldDescriptor::text("name"))),
            Ok(ask("q", FieldDescriptor::text("name"))),
        ]);
        let clock = VirtualClock::new();
        let mut machine = IntakeMachine::new(service, Arc::new(NullPlayer), clock)
            .with_seed("language", "Hindi");

        machine.start().await;
        assert_eq!(
            requests.lock()[0].collected_data.get("language").map(String::as_str),
            Some("Hindi")
        );

        machine.reset();
        assert!(machine.messages().is_empty());
        assert_eq!(
            machine.collected().get("language").map(String::as_str),
            Some("Hindi")
        );

        // start() fires again after a reset
        machine.start().await;
        assert_eq!(requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_events_are_broadcast_in_order() {
        let (mut machine, _requests, _clock) =
            make_machine(vec![Ok(ask("What is your name?", FieldDescriptor::text("name")))]);

        let mut events = machine.subscribe();
        machine.start().await;

        assert!(matches!(events.try_recv(), Ok(IntakeEvent::ExchangeStart)));
        assert!(matches!(events.try_recv(), Ok(IntakeEvent::MessageAppended { .. })));
        assert!(matches!(events.try_recv(), Ok(IntakeEvent::FieldChanged { .. })));
        assert!(matches!(events.try_recv(), Ok(IntakeEvent::ExchangeEnd)));
    }
}
