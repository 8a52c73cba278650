//! rodio-backed speech playback.
//!
//! The audio output stream is not `Send`, so a dedicated thread owns it and
//! the player handle talks to it over a channel. Exactly one sink is alive
//! at a time: a new clip stops and drops the previous one before playing.

use async_trait::async_trait;
use ayu_api::AudioClip;
use ayu_intake::{PlaybackError, SpeechPlayer};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Command {
    Play(Vec<u8>),
    Stop,
}

/// Speech playback over the default audio output device.
///
/// Device failures degrade: the first failure is deferred and retried on the
/// next play request, a second consecutive failure disables playback for the
/// rest of the session.
pub struct RodioPlayer {
    tx: Sender<Command>,
    playing: Arc<AtomicBool>,
    disabled: Arc<AtomicBool>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        let playing = Arc::new(AtomicBool::new(false));
        let disabled = Arc::new(AtomicBool::new(false));

        let thread_playing = playing.clone();
        let thread_disabled = disabled.clone();
        let spawned = std::thread::Builder::new()
            .name("ayu-audio".to_string())
            .spawn(move || audio_thread(rx, thread_playing, thread_disabled));
        if let Err(e) = spawned {
            tracing::warn!("could not start audio thread, playback disabled: {e}");
            disabled.store(true, Ordering::Release);
        }

        Self {
            tx,
            playing,
            disabled,
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechPlayer for RodioPlayer {
    async fn play(&self, clip: AudioClip) -> Result<(), PlaybackError> {
        if self.disabled.load(Ordering::Acquire) {
            return Err(PlaybackError::Disabled);
        }
        self.tx
            .send(Command::Play(clip.into_bytes()))
            .map_err(|_| PlaybackError::DeviceUnavailable)?;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }
}

fn audio_thread(rx: Receiver<Command>, playing: Arc<AtomicBool>, disabled: Arc<AtomicBool>) {
    let mut output: Option<(rodio::OutputStream, rodio::OutputStreamHandle)> = None;
    let mut sink: Option<rodio::Sink> = None;
    let mut device_failures: u32 = 0;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Command::Play(bytes)) => {
                if disabled.load(Ordering::Acquire) {
                    continue;
                }
                // Release the previous playback before starting the new clip
                if let Some(old) = sink.take() {
                    old.stop();
                }
                match start_playback(&mut output, bytes) {
                    Ok(new_sink) => {
                        device_failures = 0;
                        sink = Some(new_sink);
                    }
                    Err(PlaybackError::DeviceUnavailable) => {
                        output = None;
                        device_failures += 1;
                        if device_failures >= 2 {
                            tracing::warn!("audio device unavailable twice, disabling playback");
                            disabled.store(true, Ordering::Release);
                        } else {
                            tracing::debug!("audio device unavailable, will retry on next clip");
                        }
                    }
                    Err(e) => {
                        // Undecodable clips are skipped without touching the
                        // device failure count
                        tracing::debug!("audio clip skipped: {e}");
                    }
                }
            }
            Ok(Command::Stop) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        // Keep the playing signal current and drop finished sinks
        if sink.as_ref().is_some_and(|s| s.empty()) {
            sink = None;
        }
        playing.store(sink.is_some(), Ordering::Release);
    }
}

fn start_playback(
    output: &mut Option<(rodio::OutputStream, rodio::OutputStreamHandle)>,
    bytes: Vec<u8>,
) -> Result<rodio::Sink, PlaybackError> {
    if output.is_none() {
        let opened = rodio::OutputStream::try_default().map_err(|e| {
            tracing::debug!("opening audio output failed: {e}");
            PlaybackError::DeviceUnavailable
        })?;
        *output = Some(opened);
    }
    let Some((_stream, handle)) = output.as_ref() else {
        return Err(PlaybackError::DeviceUnavailable);
    };

    let sink = rodio::Sink::try_new(handle).map_err(|_| PlaybackError::DeviceUnavailable)?;
    let source =
        rodio::Decoder::new(Cursor::new(bytes)).map_err(|e| PlaybackError::Decode(e.to_string()))?;
    sink.append(source);
    Ok(sink)
}
