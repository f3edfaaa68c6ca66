//! Remote inference gateway
//!
//! Thin request/response client for the drawing service. The service may be
//! slow, fail, or time out; every operation is idempotent from the caller's
//! perspective and carries no client-side retry — the flow controller owns
//! retry policy.

pub mod client;
pub mod parent;
pub mod types;

pub use client::HttpGateway;
pub use parent::{DrawingSummary, ParentClient, SessionDetail, SessionRecap, SessionSummary};
pub use types::{
    AnalyzeReply, AudioPayload, PayloadId, PromptReply, ServiceError, TranscribeReply,
};

use crate::media::{AudioBlob, CapturedImage};

/// The four external operations the session flow depends on
#[async_trait::async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Fetch a fresh drawing prompt
    async fn get_prompt(&self) -> Result<PromptReply, ServiceError>;

    /// Upload a captured drawing; on success the reply binds the session's
    /// drawing/question identifiers and may carry a spoken question
    async fn analyze_drawing(
        &self,
        image: &CapturedImage,
        prompt: &str,
    ) -> Result<AnalyzeReply, ServiceError>;

    /// Submit the recorded answer (an empty recording is a valid submission)
    async fn transcribe_answer(
        &self,
        audio: &AudioBlob,
        drawing_id: i64,
        question_id: i64,
    ) -> Result<TranscribeReply, ServiceError>;
}
