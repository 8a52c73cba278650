//! Background tasks bridging the intake runtime to the UI loop

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use ayu_api::{BookingConfirmation, BookingRequest, IntakeClient};
use ayu_intake::{
    DemoEvent, IntakeEvent, IntakeMachine, ScriptedSequencer, SpeechPlayer, SpeechSynth,
};

/// User actions forwarded to the conversation task
#[derive(Debug, Clone)]
pub enum UserAction {
    Start,
    Text(String),
    Choose(String),
    Pay,
    Replay,
    /// Reset and re-open the conversation (the "edit details" path)
    Restart,
}

/// Everything the UI loop consumes from background work
#[derive(Debug)]
pub enum UiEvent {
    Intake(IntakeEvent),
    Demo(DemoEvent),
    Booking(Result<BookingConfirmation, String>),
}

/// Run the intake machine on its own task so the UI stays responsive while
/// exchanges (and the completion delay) are in flight. Machine events are
/// forwarded into the shared UI channel.
pub fn spawn_conversation(
    mut machine: IntakeMachine,
    mut actions: mpsc::Receiver<UserAction>,
    events: mpsc::Sender<UiEvent>,
) -> JoinHandle<()> {
    forward_intake(machine.subscribe(), events);
    tokio::spawn(async move {
        while let Some(action) = actions.recv().await {
            match action {
                UserAction::Start => machine.start().await,
                UserAction::Text(text) => machine.submit_text(&text).await,
                UserAction::Choose(option) => machine.choose_option(&option).await,
                UserAction::Pay => machine.confirm_payment().await,
                UserAction::Replay => machine.replay_speech().await,
                UserAction::Restart => {
                    machine.reset();
                    machine.start().await;
                }
            }
        }
    })
}

fn forward_intake(mut rx: broadcast::Receiver<IntakeEvent>, events: mpsc::Sender<UiEvent>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if events.send(UiEvent::Intake(event)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("UI lagged behind {n} intake events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Play a scenario on its own task, forwarding demo events to the UI
pub fn spawn_demo(mut sequencer: ScriptedSequencer, events: mpsc::Sender<UiEvent>) -> JoinHandle<()> {
    let mut rx = sequencer.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if events.send(UiEvent::Demo(event)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("UI lagged behind {n} demo events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    tokio::spawn(async move {
        sequencer.run().await;
    })
}

/// Book the appointment in the background
pub fn spawn_booking(
    client: IntakeClient,
    request: BookingRequest,
    events: mpsc::Sender<UiEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.book(&request).await.map_err(|e| {
            tracing::warn!("appointment booking failed: {e}");
            e.to_string()
        });
        let _ = events.send(UiEvent::Booking(result)).await;
    })
}

/// Fire-and-forget spoken line (report greeting, confirmation voice)
pub fn spawn_speech(
    synth: Arc<dyn SpeechSynth>,
    player: Arc<dyn SpeechPlayer>,
    text: String,
    language: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match synth.synthesize(&text, &language).await {
            Ok(clip) => {
                if let Err(e) = player.play(clip).await {
                    tracing::debug!("voice line playback skipped: {e}");
                }
            }
            Err(e) => tracing::debug!("voice line synthesis skipped: {e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ayu_api::{
        ExchangeOutcome, ExchangeRequest, ExchangeResponse, FieldDescriptor,
    };
    use ayu_intake::{IntakeService, NullPlayer, TokioClock};

    struct OneQuestionService;

    #[async_trait]
    impl IntakeService for OneQuestionService {
        async fn exchange(&self, _request: ExchangeRequest) -> ayu_api::Result<ExchangeResponse> {
            Ok(ExchangeResponse {
                question: "What is your name?".into(),
                speech: None,
                outcome: ExchangeOutcome::Ask(FieldDescriptor::text("name")),
            })
        }
    }

    #[tokio::test]
    async fn test_conversation_task_forwards_events() {
        let machine = IntakeMachine::new(
            Arc::new(OneQuestionService),
            Arc::new(NullPlayer),
            Arc::new(TokioClock),
        );
        let (actions_tx, actions_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(32);
        let task = spawn_conversation(machine, actions_rx, events_tx);

        actions_tx.send(UserAction::Start).await.unwrap();

        // Expect the exchange lifecycle to arrive on the UI channel
        let mut saw_message = false;
        let mut saw_end = false;
        for _ in 0..8 {
            match tokio::time::timeout(std::time::Duration::from_secs(1), events_rx.recv()).await {
                Ok(Some(UiEvent::Intake(IntakeEvent::MessageAppended { .. }))) => {
                    saw_message = true;
                }
                Ok(Some(UiEvent::Intake(IntakeEvent::ExchangeEnd))) => {
                    saw_end = true;
                    break;
                }
                Ok(Some(_)) => {}
                _ => break,
            }
        }
        assert!(saw_message && saw_end);

        drop(actions_tx);
        task.await.unwrap();
    }
}
