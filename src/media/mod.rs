//! Media capture adapter
//!
//! Device acquisition and release for the camera and microphone, plus the
//! answer recorder that buffers spoken-answer frames. Devices are owned for
//! as short a span as possible and always released before a result is
//! reported upward.

pub mod backend;
pub mod recorder;
pub mod scripted;

pub use backend::{
    AudioBlob, AudioFrame, CameraDevice, CapturedImage, MediaBackend, MediaError, MicrophoneDevice,
};
pub use recorder::AnswerRecorder;
pub use scripted::{tone_frames, ScriptedMedia};
