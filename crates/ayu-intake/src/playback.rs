//! Speech playback capability

use async_trait::async_trait;
use ayu_api::AudioClip;
use thiserror::Error;

/// Errors from the playback adapter
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No audio output device could be opened
    #[error("no audio output device available")]
    DeviceUnavailable,

    /// The payload could not be decoded as audio
    #[error("unsupported audio payload: {0}")]
    Decode(String),

    /// Playback was disabled after repeated device failures
    #[error("playback disabled after repeated failures")]
    Disabled,
}

/// Audio output capability injected into the intake machine and sequencer.
///
/// Exactly one playback may be audible at a time: `play` releases the
/// previous playback before starting the new clip.
#[async_trait]
pub trait SpeechPlayer: Send + Sync {
    /// Start playback of the clip, releasing any prior playback first
    async fn play(&self, clip: AudioClip) -> Result<(), PlaybackError>;

    /// Whether audio is currently audible (drives the speaking indicator)
    fn is_playing(&self) -> bool;

    /// Stop current playback
    fn stop(&self);
}

/// No-op player for tests, `--mute`, and headless environments
#[derive(Debug, Default)]
pub struct NullPlayer;

#[async_trait]
impl SpeechPlayer for NullPlayer {
    async fn play(&self, _clip: AudioClip) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn stop(&self) {}
}
