//! Scripted playback sequencer for the AI-doctor demo.
//!
//! Replays a canned scenario on a fixed cadence. One flat loop advances on
//! clock sleeps; there is no nested timer choreography, so the whole
//! sequence runs under a virtual clock in tests.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::clock::Clock;
use crate::playback::SpeechPlayer;
use crate::scenario::{Scenario, ScriptLine};
use crate::service::SpeechSynth;
use crate::session::Language;
use crate::transcript::Role;

/// Delay before the first scripted line
pub const INITIAL_DELAY: Duration = Duration::from_millis(400);
/// Pause after a patient line before the assistant reacts
pub const USER_LINE_DELAY: Duration = Duration::from_millis(1200);
/// How long the assistant "thinks" before speaking
pub const THINKING_DELAY: Duration = Duration::from_millis(1500);
/// Pause after an assistant line before the next patient line
pub const NEXT_LINE_DELAY: Duration = Duration::from_millis(3000);

/// Speech synthesis is capped to the opening of long scripted lines
const SPEECH_CHAR_LIMIT: usize = 200;

/// Assistant activity phase shown beside the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Listening,
    Thinking,
    Speaking,
}

/// Events emitted while a scenario plays back
#[derive(Debug, Clone)]
pub enum DemoEvent {
    /// The activity phase changed
    PhaseChanged(Phase),
    /// A scripted line was revealed
    Line {
        line: ScriptLine,
        timestamp: i64,
    },
    /// The scenario reached its final line
    Finished,
}

/// Plays one scenario to completion
pub struct ScriptedSequencer {
    scenario: Scenario,
    language: Language,
    phase: Phase,
    synth: Arc<dyn SpeechSynth>,
    player: Arc<dyn SpeechPlayer>,
    clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<DemoEvent>,
}

impl ScriptedSequencer {
    pub fn new(
        scenario: Scenario,
        language: Language,
        synth: Arc<dyn SpeechSynth>,
        player: Arc<dyn SpeechPlayer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            scenario,
            language,
            phase: Phase::Listening,
            synth,
            player,
            clock,
            event_tx,
        }
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<DemoEvent> {
        self.event_tx.subscribe()
    }

    /// The scenario being played
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Current activity phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Play the scenario from the first line to the last. Synthesis and
    /// playback failures are skipped silently; the script keeps advancing.
    pub async fn run(&mut self) {
        self.clock.sleep(INITIAL_DELAY).await;

        let lines = self.scenario.lines.clone();
        for (idx, line) in lines.iter().enumerate() {
            match line.role {
                Role::User => {
                    self.set_phase(Phase::Listening);
                    self.reveal(line);
                    self.clock.sleep(USER_LINE_DELAY).await;
                }
                Role::Assistant => {
                    self.set_phase(Phase::Thinking);
                    self.clock.sleep(THINKING_DELAY).await;
                    self.set_phase(Phase::Speaking);
                    self.reveal(line);
                    self.speak(&line.text).await;

                    if idx + 1 < lines.len() {
                        self.clock.sleep(NEXT_LINE_DELAY).await;
                    } else {
                        self.set_phase(Phase::Listening);
                    }
                }
            }
        }

        let _ = self.event_tx.send(DemoEvent::Finished);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            let _ = self.event_tx.send(DemoEvent::PhaseChanged(phase));
        }
    }

    fn reveal(&self, line: &ScriptLine) {
        let _ = self.event_tx.send(DemoEvent::Line {
            line: line.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    async fn speak(&self, text: &str) {
        let excerpt: String = text.chars().take(SPEECH_CHAR_LIMIT).collect();
        let clip = match self.synth.synthesize(&excerpt, self.language.as_str()).await {
            Ok(clip) => clip,
            Err(e) => {
                tracing::debug!("demo speech synthesis skipped: {e}");
                return;
            }
        };
        if let Err(e) = self.player.play(clip).await {
            tracing::debug!("demo speech playback skipped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::playback::{NullPlayer, PlaybackError, SpeechPlayer};
    use crate::scenario::builtin_scenarios;
    use async_trait::async_trait;
    use ayu_api::AudioClip;
    use parking_lot::Mutex;

    /// Records synthesis requests; optionally fails every call.
    struct FakeSynth {
        requests: Arc<Mutex<Vec<(String, String)>>>,
        fail: bool,
    }

    impl FakeSynth {
        fn new(fail: bool) -> (Arc<Self>, Arc<Mutex<Vec<(String, String)>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            (
                Arc::new(Self {
                    requests: requests.clone(),
                    fail,
                }),
                requests,
            )
        }
    }

    #[async_trait]
    impl SpeechSynth for FakeSynth {
        async fn synthesize(&self, text: &str, language: &str) -> ayu_api::Result<AudioClip> {
            self.requests.lock().push((text.to_string(), language.to_string()));
            if self.fail {
                Err(ayu_api::Error::Api {
                    status: 500,
                    message: "synth down".into(),
                })
            } else {
                Ok(AudioClip::from_bytes(vec![0u8; 4]))
            }
        }
    }

    /// Counts plays; optionally fails every call.
    struct CountingPlayer {
        plays: Arc<Mutex<u32>>,
        fail: bool,
    }

    impl CountingPlayer {
        fn new(fail: bool) -> (Arc<Self>, Arc<Mutex<u32>>) {
            let plays = Arc::new(Mutex::new(0));
            (
                Arc::new(Self {
                    plays: plays.clone(),
                    fail,
                }),
                plays,
            )
        }
    }

    #[async_trait]
    impl SpeechPlayer for CountingPlayer {
        async fn play(&self, _clip: AudioClip) -> Result<(), PlaybackError> {
            *self.plays.lock() += 1;
            if self.fail {
                Err(PlaybackError::DeviceUnavailable)
            } else {
                Ok(())
            }
        }

        fn is_playing(&self) -> bool {
            false
        }

        fn stop(&self) {}
    }

    async fn drive<T>(clock: &Arc<VirtualClock>, fut: impl Future<Output = T>) -> T {
        let mut fut = std::pin::pin!(fut);
        for _ in 0..10_000 {
            if let std::task::Poll::Ready(value) = futures::poll!(&mut fut) {
                return value;
            }
            clock.advance(Duration::from_millis(100));
            tokio::task::yield_now().await;
        }
        panic!("future did not complete under the virtual clock");
    }

    fn two_turn_scenario() -> Scenario {
        let mut scenario = builtin_scenarios().remove(2);
        assert_eq!(scenario.lines.len(), 4);
        scenario.lines.truncate(4);
        scenario
    }

    #[tokio::test]
    async fn test_sequencer_reveals_lines_in_script_order() {
        let scenario = two_turn_scenario();
        let expected: Vec<String> = scenario.lines.iter().map(|l| l.text.clone()).collect();

        let (synth, _) = FakeSynth::new(false);
        let clock = VirtualClock::new();
        let mut sequencer = ScriptedSequencer::new(
            scenario,
            Language::English,
            synth,
            Arc::new(NullPlayer),
            clock.clone(),
        );
        let mut events = sequencer.subscribe();

        drive(&clock, sequencer.run()).await;

        let mut revealed = Vec::new();
        let mut finished = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                DemoEvent::Line { line, .. } => revealed.push(line.text),
                DemoEvent::Finished => finished += 1,
                DemoEvent::PhaseChanged(_) => {}
            }
        }
        assert_eq!(revealed, expected);
        assert_eq!(finished, 1);
        assert_eq!(sequencer.phase(), Phase::Listening);
    }

    #[tokio::test]
    async fn test_sequencer_phase_progression() {
        let scenario = two_turn_scenario();
        let (synth, _) = FakeSynth::new(false);
        let clock = VirtualClock::new();
        let mut sequencer = ScriptedSequencer::new(
            scenario,
            Language::English,
            synth,
            Arc::new(NullPlayer),
            clock.clone(),
        );
        let mut events = sequencer.subscribe();

        drive(&clock, sequencer.run()).await;

        let phases: Vec<Phase> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|e| match e {
                DemoEvent::PhaseChanged(p) => Some(p),
                _ => None,
            })
            .collect();
        // user, assistant, user, assistant:
        // thinking/speaking for each assistant line, listening between and at
        // the end. The opening Listening is the default and not re-emitted.
        assert_eq!(
            phases,
            vec![
                Phase::Thinking,
                Phase::Speaking,
                Phase::Listening,
                Phase::Thinking,
                Phase::Speaking,
                Phase::Listening,
            ]
        );
    }

    #[tokio::test]
    async fn test_sequencer_total_cadence() {
        let scenario = two_turn_scenario();
        let (synth, _) = FakeSynth::new(false);
        let clock = VirtualClock::new();
        let mut sequencer = ScriptedSequencer::new(
            scenario,
            Language::English,
            synth,
            Arc::new(NullPlayer),
            clock.clone(),
        );

        drive(&clock, sequencer.run()).await;

        // 400 initial + (1200 user + 1500 thinking + 3000 gap) + 1200 user
        // + 1500 thinking, with no gap after the final line.
        let expected = INITIAL_DELAY
            + USER_LINE_DELAY
            + THINKING_DELAY
            + NEXT_LINE_DELAY
            + USER_LINE_DELAY
            + THINKING_DELAY;
        assert_eq!(clock.elapsed(), expected);
    }

    #[tokio::test]
    async fn test_sequencer_truncates_speech_and_uses_language() {
        let mut scenario = two_turn_scenario();
        scenario.lines[1].text = "x".repeat(500);
        scenario.lines.truncate(2);

        let (synth, requests) = FakeSynth::new(false);
        let clock = VirtualClock::new();
        let mut sequencer = ScriptedSequencer::new(
            scenario,
            Language::Hindi,
            synth,
            Arc::new(NullPlayer),
            clock.clone(),
        );

        drive(&clock, sequencer.run()).await;

        let requests = requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.chars().count(), 200);
        assert_eq!(requests[0].1, "Hindi");
    }

    #[tokio::test]
    async fn test_sequencer_survives_speech_failures() {
        let scenario = two_turn_scenario();
        let line_count = scenario.lines.len();

        let (synth, _) = FakeSynth::new(true);
        let (player, plays) = CountingPlayer::new(true);
        let clock = VirtualClock::new();
        let mut sequencer =
            ScriptedSequencer::new(scenario, Language::English, synth, player, clock.clone());
        let mut events = sequencer.subscribe();

        drive(&clock, sequencer.run()).await;

        let revealed = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| matches!(e, DemoEvent::Line { .. }))
            .count();
        assert_eq!(revealed, line_count);
        // Synthesis failed, so playback was never reached
        assert_eq!(*plays.lock(), 0);
    }
}
