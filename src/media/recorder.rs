use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{AudioBlob, AudioFrame, MediaError, MicrophoneDevice};

/// Buffers microphone frames for one spoken answer.
///
/// Frames are collected in arrival order on a background task while the
/// child speaks; `stop` releases the microphone and concatenates whatever
/// arrived. Zero frames is a valid outcome — the caller decides whether an
/// empty answer is worth submitting.
pub struct AnswerRecorder {
    device: Box<dyn MicrophoneDevice>,
    collector: JoinHandle<Vec<AudioFrame>>,
    fallback_sample_rate: u32,
    fallback_channels: u16,
}

impl std::fmt::Debug for AnswerRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerRecorder")
            .field("fallback_sample_rate", &self.fallback_sample_rate)
            .field("fallback_channels", &self.fallback_channels)
            .finish_non_exhaustive()
    }
}

impl AnswerRecorder {
    /// Start recording on an already-open microphone
    pub async fn start(
        mut device: Box<dyn MicrophoneDevice>,
        fallback_sample_rate: u32,
        fallback_channels: u16,
    ) -> Result<Self, MediaError> {
        let mut frame_rx = match device.start().await {
            Ok(frame_rx) => frame_rx,
            Err(e) => {
                // The device was handed to us open; release it before
                // reporting that recording never began.
                if let Err(release_err) = device.stop().await {
                    warn!("Microphone release after failed start: {}", release_err);
                }
                return Err(e);
            }
        };

        let collector = tokio::spawn(async move {
            let mut frames = Vec::new();
            while let Some(frame) = frame_rx.recv().await {
                frames.push(frame);
            }
            frames
        });

        info!("Answer recording started");

        Ok(Self {
            device,
            collector,
            fallback_sample_rate,
            fallback_channels,
        })
    }

    /// Finalize the buffer and release the microphone.
    ///
    /// The device is released even when it reports a failed recording.
    pub async fn stop(mut self) -> Result<AudioBlob, MediaError> {
        let stop_result = self.device.stop().await;

        // Stopping the device closes the frame channel, which ends the
        // collector task.
        let frames = match self.collector.await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Frame collector task failed: {}", e);
                Vec::new()
            }
        };

        stop_result?;

        let blob = Self::concatenate(frames, self.fallback_sample_rate, self.fallback_channels);
        info!(
            "Answer recording stopped: {} samples ({} ms)",
            blob.samples.len(),
            blob.duration_ms()
        );

        Ok(blob)
    }

    /// Release the microphone and discard everything buffered so far
    pub async fn abort(mut self) {
        if let Err(e) = self.device.stop().await {
            warn!("Microphone release during abort failed: {}", e);
        }
        self.collector.abort();
        info!("Answer recording aborted, buffer discarded");
    }

    fn concatenate(frames: Vec<AudioFrame>, sample_rate: u32, channels: u16) -> AudioBlob {
        match frames.first() {
            Some(first) => {
                let sample_rate = first.sample_rate;
                let channels = first.channels;
                let samples: Vec<i16> = frames.into_iter().flat_map(|f| f.samples).collect();
                AudioBlob {
                    samples,
                    sample_rate,
                    channels,
                }
            }
            None => AudioBlob::empty(sample_rate, channels),
        }
    }
}
