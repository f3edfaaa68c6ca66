use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by device adapters. Never retried automatically;
/// retry is a user-initiated re-entry into the capturing/recording stage.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    /// Permission denied or hardware absent
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Transient camera read failure
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// The device reported a failed recording (distinct from a valid empty one)
    #[error("no audio captured")]
    RecordingEmpty,
}

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
}

/// A still image sampled from the camera feed
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Finalized answer audio. An empty blob (zero samples) is a valid result:
/// a child declining to answer still produces a submittable recording.
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBlob {
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels.max(1) as u64;
        frames * 1000 / self.sample_rate.max(1) as u64
    }

    /// Encode as a 16-bit PCM WAV byte stream for upload
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, MediaError> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| MediaError::CaptureFailed(format!("wav encode: {}", e)))?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| MediaError::CaptureFailed(format!("wav encode: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| MediaError::CaptureFailed(format!("wav encode: {}", e)))?;
        }
        Ok(cursor.into_inner())
    }
}

/// Device access adapter
///
/// Implementations:
/// - Scripted: deterministic backend for tests and the demo command
/// - Platform backends (cpal microphone, camera bridge) plug in behind
///   the same traits
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Request exclusive access to the video device
    async fn open_camera(&self) -> Result<Box<dyn CameraDevice>, MediaError>;

    /// Request exclusive access to the audio input device
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneDevice>, MediaError>;
}

/// An open camera. The holder must call `close` before leaving the capture
/// stage, on both success and error paths.
#[async_trait::async_trait]
pub trait CameraDevice: Send {
    /// Sample the live feed into a still image; does not close the device
    async fn capture_still(&mut self) -> Result<CapturedImage, MediaError>;

    /// Release the device. Idempotent.
    async fn close(&mut self);
}

/// An open microphone
#[async_trait::async_trait]
pub trait MicrophoneDevice: Send {
    /// Begin capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames in
    /// arrival order. The channel closes when the device stops.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, MediaError>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<(), MediaError>;
}
