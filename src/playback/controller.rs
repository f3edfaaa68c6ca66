use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::sink::{AudioSink, DecodedClip, PlaybackError};
use crate::gateway::{AudioPayload, PayloadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Finished,
    Failed,
}

#[derive(Debug, Clone)]
pub enum PlaybackOutcome {
    Finished,
    Failed(PlaybackError),
}

/// Terminal notification for one payload
#[derive(Debug, Clone)]
pub struct PlaybackEvent {
    pub payload: PayloadId,
    pub outcome: PlaybackOutcome,
}

/// Plays delivered speech payloads exactly once each.
///
/// A payload identity that has already been played is ignored, so re-entering
/// a stage cannot replay its audio. A `play` arriving while an earlier payload
/// is still loading or playing interrupts and discards the earlier one
/// (last-write-wins); a generation counter makes sure a superseded payload
/// never emits a terminal event.
pub struct PlaybackController {
    sink: Arc<dyn AudioSink>,
    events: mpsc::Sender<PlaybackEvent>,
    generation: Arc<AtomicU64>,
    state: Arc<Mutex<PlaybackState>>,
    task: Mutex<Option<JoinHandle<()>>>,
    played: Mutex<HashSet<PayloadId>>,
}

impl PlaybackController {
    pub fn new(sink: Arc<dyn AudioSink>) -> (Self, mpsc::Receiver<PlaybackEvent>) {
        let (events, event_rx) = mpsc::channel(16);
        let controller = Self {
            sink,
            events,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(PlaybackState::Idle)),
            task: Mutex::new(None),
            played: Mutex::new(HashSet::new()),
        };
        (controller, event_rx)
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock().expect("playback state lock")
    }

    /// Schedule decode and playback of one payload. Fire-and-forget:
    /// completion or failure arrives on the event channel.
    pub fn play(&self, payload: AudioPayload) {
        {
            let mut played = self.played.lock().expect("played set lock");
            if !played.insert(payload.id) {
                debug!("Payload {} already played, ignoring", payload.id);
                return;
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Last-write-wins: interrupt whatever is in flight
        if let Some(previous) = self.task.lock().expect("task lock").take() {
            previous.abort();
            debug!("Superseding in-flight playback");
        }

        set_state(&self.state, PlaybackState::Loading);

        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let current = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let payload_id = payload.id;

        let handle = tokio::spawn(async move {
            let clip = match decode_wav(&payload.wav) {
                Ok(clip) => clip,
                Err(e) => {
                    if current.load(Ordering::SeqCst) == generation {
                        warn!("Audio decode failed for {}: {}", payload_id, e);
                        set_state(&state, PlaybackState::Failed);
                        let _ = events
                            .send(PlaybackEvent {
                                payload: payload_id,
                                outcome: PlaybackOutcome::Failed(e),
                            })
                            .await;
                    }
                    return;
                }
            };

            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            set_state(&state, PlaybackState::Playing);

            let result = sink.play(clip).await;

            // A superseded payload must not emit a terminal event
            if current.load(Ordering::SeqCst) != generation {
                return;
            }

            let outcome = match result {
                Ok(()) => {
                    set_state(&state, PlaybackState::Finished);
                    PlaybackOutcome::Finished
                }
                Err(e) => {
                    warn!("Playback failed for {}: {}", payload_id, e);
                    set_state(&state, PlaybackState::Failed);
                    PlaybackOutcome::Failed(e)
                }
            };

            let _ = events
                .send(PlaybackEvent {
                    payload: payload_id,
                    outcome,
                })
                .await;
        });

        *self.task.lock().expect("task lock") = Some(handle);
    }

    /// Interrupt any in-flight playback and return to idle
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.lock().expect("task lock").take() {
            task.abort();
        }
        set_state(&self.state, PlaybackState::Idle);
    }
}

fn set_state(state: &Mutex<PlaybackState>, value: PlaybackState) {
    *state.lock().expect("playback state lock") = value;
}

/// Decode a 16-bit PCM WAV payload into samples for the sink
fn decode_wav(bytes: &[u8]) -> Result<DecodedClip, PlaybackError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(PlaybackError::Decode(format!(
            "unsupported format: {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;

    Ok(DecodedClip {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
