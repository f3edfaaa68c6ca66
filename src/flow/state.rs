use uuid::Uuid;

use crate::gateway::{AudioPayload, ServiceError};
use crate::media::{AudioBlob, CapturedImage, MediaError};
use crate::playback::PlaybackError;

/// Discrete state of one child session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prompting,
    Capturing,
    Analyzing,
    AwaitingAnswer,
    Recording,
    Submitting,
    Responding,
    Finished,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Prompting => "prompting",
            Stage::Capturing => "capturing",
            Stage::Analyzing => "analyzing",
            Stage::AwaitingAnswer => "awaiting-answer",
            Stage::Recording => "recording",
            Stage::Submitting => "submitting",
            Stage::Responding => "responding",
            Stage::Finished => "finished",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DeviceUnavailable,
    CaptureFailed,
    RecordingEmpty,
    Service,
    AudioPlayback,
    Internal,
}

/// User-visible record of the most recent caught error
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn from_media(error: &MediaError) -> Self {
        let kind = match error {
            MediaError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            MediaError::CaptureFailed(_) => ErrorKind::CaptureFailed,
            MediaError::RecordingEmpty => ErrorKind::RecordingEmpty,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }

    pub fn from_service(error: &ServiceError) -> Self {
        Self {
            kind: ErrorKind::Service,
            message: error.to_string(),
        }
    }

    pub fn from_playback(error: &PlaybackError) -> Self {
        Self {
            kind: ErrorKind::AudioPlayback,
            message: error.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
        }
    }
}

/// In-memory record of one session, owned exclusively by the flow controller
/// for the session's lifetime.
///
/// `drawing_id`/`question_id` are bound together after a successful analyze
/// call and never change afterward within the session. `answer_audio` exists
/// only around submission; a failed submit discards it.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    pub prompt: Option<String>,
    pub captured_image: Option<CapturedImage>,
    pub drawing_id: Option<i64>,
    pub question_id: Option<i64>,
    pub question_text: Option<String>,
    pub question_audio: Option<AudioPayload>,
    pub answer_audio: Option<AudioBlob>,
    pub response_text: Option<String>,
    pub response_audio: Option<AudioPayload>,
    pub stage: Stage,
    pub last_error: Option<ErrorInfo>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            prompt: None,
            captured_image: None,
            drawing_id: None,
            question_id: None,
            question_text: None,
            question_audio: None,
            answer_audio: None,
            response_text: None,
            response_audio: None,
            stage: Stage::Prompting,
            last_error: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
