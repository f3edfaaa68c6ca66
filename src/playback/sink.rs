use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("playback failed: {0}")]
    Output(String),
}

/// Decoded PCM clip ready for output
#[derive(Debug, Clone)]
pub struct DecodedClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedClip {
    pub fn duration(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as u64 / self.channels.max(1) as u64;
        Duration::from_millis(frames * 1000 / self.sample_rate.max(1) as u64)
    }
}

/// Audio output seam. The controller decodes; the sink renders.
///
/// `play` resolves when the clip has finished rendering (or failed); the
/// controller aborts the future to interrupt a superseded clip.
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, clip: DecodedClip) -> Result<(), PlaybackError>;
}

/// Sink that consumes clips in real time without an output device.
/// Used by the demo command and anywhere speakers are absent.
pub struct NullSink;

#[async_trait::async_trait]
impl AudioSink for NullSink {
    async fn play(&self, clip: DecodedClip) -> Result<(), PlaybackError> {
        let duration = clip.duration();
        debug!("NullSink consuming {:?} of audio", duration);
        tokio::time::sleep(duration).await;
        Ok(())
    }
}
