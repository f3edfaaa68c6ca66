//! Audio playback controller
//!
//! Decodes delivered audio payloads and plays each exactly once, reporting
//! completion or failure as events. Playback failure is never fatal to a
//! session; the question/response text remains the fallback channel.

pub mod controller;
pub mod sink;

pub use controller::{PlaybackController, PlaybackEvent, PlaybackOutcome, PlaybackState};
pub use sink::{AudioSink, DecodedClip, NullSink, PlaybackError};
