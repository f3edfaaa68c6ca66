use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::info;

use super::backend::{
    AudioFrame, CameraDevice, CapturedImage, MediaBackend, MediaError, MicrophoneDevice,
};

/// Deterministic media backend.
///
/// Stands in for real camera/microphone hardware in integration tests and
/// the `demo` command: capture outcomes are scripted up front, and every
/// open/close is counted so release discipline can be asserted.
pub struct ScriptedMedia {
    shared: Arc<Shared>,
}

struct Shared {
    camera_denied: AtomicBool,
    capture_fails: AtomicBool,
    mic_denied: AtomicBool,
    start_fails: AtomicBool,
    recording_fails: AtomicBool,
    image: Mutex<Vec<u8>>,
    frames: Mutex<Vec<AudioFrame>>,
    camera_opens: AtomicUsize,
    camera_closes: AtomicUsize,
    mic_opens: AtomicUsize,
    mic_closes: AtomicUsize,
}

impl ScriptedMedia {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                camera_denied: AtomicBool::new(false),
                capture_fails: AtomicBool::new(false),
                mic_denied: AtomicBool::new(false),
                start_fails: AtomicBool::new(false),
                recording_fails: AtomicBool::new(false),
                image: Mutex::new(Vec::new()),
                frames: Mutex::new(Vec::new()),
                camera_opens: AtomicUsize::new(0),
                camera_closes: AtomicUsize::new(0),
                mic_opens: AtomicUsize::new(0),
                mic_closes: AtomicUsize::new(0),
            }),
        }
    }

    /// Image bytes returned by every successful capture
    pub fn set_image(&self, bytes: Vec<u8>) {
        *self.shared.image.lock().expect("image lock") = bytes;
    }

    /// Frames delivered by the next recording, in order
    pub fn set_frames(&self, frames: Vec<AudioFrame>) {
        *self.shared.frames.lock().expect("frames lock") = frames;
    }

    pub fn deny_camera(&self, deny: bool) {
        self.shared.camera_denied.store(deny, Ordering::SeqCst);
    }

    pub fn fail_capture(&self, fail: bool) {
        self.shared.capture_fails.store(fail, Ordering::SeqCst);
    }

    pub fn deny_microphone(&self, deny: bool) {
        self.shared.mic_denied.store(deny, Ordering::SeqCst);
    }

    pub fn fail_start(&self, fail: bool) {
        self.shared.start_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_recording(&self, fail: bool) {
        self.shared.recording_fails.store(fail, Ordering::SeqCst);
    }

    pub fn camera_opens(&self) -> usize {
        self.shared.camera_opens.load(Ordering::SeqCst)
    }

    pub fn camera_closes(&self) -> usize {
        self.shared.camera_closes.load(Ordering::SeqCst)
    }

    pub fn mic_opens(&self) -> usize {
        self.shared.mic_opens.load(Ordering::SeqCst)
    }

    pub fn mic_closes(&self) -> usize {
        self.shared.mic_closes.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedMedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaBackend for ScriptedMedia {
    async fn open_camera(&self) -> Result<Box<dyn CameraDevice>, MediaError> {
        if self.shared.camera_denied.load(Ordering::SeqCst) {
            return Err(MediaError::DeviceUnavailable(
                "camera permission denied".to_string(),
            ));
        }
        self.shared.camera_opens.fetch_add(1, Ordering::SeqCst);
        info!("Scripted camera opened");
        Ok(Box::new(ScriptedCamera {
            shared: Arc::clone(&self.shared),
            closed: false,
        }))
    }

    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneDevice>, MediaError> {
        if self.shared.mic_denied.load(Ordering::SeqCst) {
            return Err(MediaError::DeviceUnavailable(
                "microphone permission denied".to_string(),
            ));
        }
        self.shared.mic_opens.fetch_add(1, Ordering::SeqCst);
        info!("Scripted microphone opened");
        Ok(Box::new(ScriptedMicrophone {
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }
}

struct ScriptedCamera {
    shared: Arc<Shared>,
    closed: bool,
}

#[async_trait::async_trait]
impl CameraDevice for ScriptedCamera {
    async fn capture_still(&mut self) -> Result<CapturedImage, MediaError> {
        if self.shared.capture_fails.load(Ordering::SeqCst) {
            return Err(MediaError::CaptureFailed(
                "scripted camera read failure".to_string(),
            ));
        }
        let bytes = self.shared.image.lock().expect("image lock").clone();
        Ok(CapturedImage {
            bytes,
            mime: "image/png".to_string(),
        })
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.shared.camera_closes.fetch_add(1, Ordering::SeqCst);
            info!("Scripted camera closed");
        }
    }
}

struct ScriptedMicrophone {
    shared: Arc<Shared>,
    released: bool,
}

#[async_trait::async_trait]
impl MicrophoneDevice for ScriptedMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, MediaError> {
        if self.shared.start_fails.load(Ordering::SeqCst) {
            return Err(MediaError::CaptureFailed(
                "scripted microphone stream failure".to_string(),
            ));
        }
        let frames = self.shared.frames.lock().expect("frames lock").clone();
        let (tx, rx) = mpsc::channel(frames.len().max(1));
        for frame in frames {
            // Capacity covers the whole script, so this never blocks
            let _ = tx.try_send(frame);
        }
        // Dropping the sender closes the channel once the script is drained
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), MediaError> {
        if !self.released {
            self.released = true;
            self.shared.mic_closes.fetch_add(1, Ordering::SeqCst);
            info!("Scripted microphone released");
        }
        if self.shared.recording_fails.load(Ordering::SeqCst) {
            return Err(MediaError::RecordingEmpty);
        }
        Ok(())
    }
}

/// Generate a short sine tone as scripted microphone input
pub fn tone_frames(duration_ms: u64, sample_rate: u32) -> Vec<AudioFrame> {
    let frame_ms = 100u64;
    let samples_per_frame = (sample_rate as u64 * frame_ms / 1000) as usize;
    let mut frames = Vec::new();
    let mut t = 0usize;

    for index in 0..(duration_ms / frame_ms) {
        let samples: Vec<i16> = (0..samples_per_frame)
            .map(|_| {
                let phase = t as f32 * 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32;
                t += 1;
                (phase.sin() * 8000.0) as i16
            })
            .collect();
        frames.push(AudioFrame {
            samples,
            sample_rate,
            channels: 1,
            timestamp_ms: index * frame_ms,
        });
    }

    frames
}
