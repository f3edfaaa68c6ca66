pub mod config;
pub mod consent;
pub mod flow;
pub mod gateway;
pub mod media;
pub mod playback;

pub use config::{AudioConfig, Config};
pub use consent::{ConsentRecord, ConsentStore, CONSENT_VALID_DAYS};
pub use flow::{ErrorInfo, ErrorKind, SessionFlow, SessionState, Stage};
pub use gateway::{
    AnalyzeReply, AudioPayload, HttpGateway, InferenceGateway, ParentClient, PayloadId,
    PromptReply, ServiceError, TranscribeReply,
};
pub use media::{
    AnswerRecorder, AudioBlob, AudioFrame, CameraDevice, CapturedImage, MediaBackend, MediaError,
    MicrophoneDevice, ScriptedMedia,
};
pub use playback::{
    AudioSink, DecodedClip, NullSink, PlaybackController, PlaybackError, PlaybackEvent,
    PlaybackOutcome, PlaybackState,
};
