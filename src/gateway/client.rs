use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::types::{
    AnalyzeReply, AnalyzeWire, PromptReply, PromptWire, ServiceError, TranscribeReply,
    TranscribeWire,
};
use super::InferenceGateway;
use crate::media::{AudioBlob, CapturedImage};

/// HTTP client for the inference service.
///
/// One request per operation, no client-side retry: the flow controller owns
/// retry policy. Timeouts, if any, are the collaborator's concern.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl InferenceGateway for HttpGateway {
    async fn get_prompt(&self) -> Result<PromptReply, ServiceError> {
        debug!("Fetching drawing prompt");

        let response = self
            .client
            .get(self.url("/prompt"))
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let wire: PromptWire = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        wire.try_into()
    }

    async fn analyze_drawing(
        &self,
        image: &CapturedImage,
        prompt: &str,
    ) -> Result<AnalyzeReply, ServiceError> {
        info!("Uploading drawing for analysis ({} bytes)", image.bytes.len());

        let part = Part::bytes(image.bytes.clone())
            .file_name("drawing.png")
            .mime_str(&image.mime)
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let form = Form::new()
            .part("image", part)
            .text("prompt", prompt.to_string());

        let response = self
            .client
            .post(self.url("/analyze-drawing"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let wire: AnalyzeWire = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        wire.try_into()
    }

    async fn transcribe_answer(
        &self,
        audio: &AudioBlob,
        drawing_id: i64,
        question_id: i64,
    ) -> Result<TranscribeReply, ServiceError> {
        info!(
            "Submitting answer for drawing {} / question {} ({} ms of audio)",
            drawing_id,
            question_id,
            audio.duration_ms()
        );

        let wav = audio
            .to_wav_bytes()
            .map_err(|e| ServiceError::Transport(format!("encode answer audio: {}", e)))?;

        let part = Part::bytes(wav)
            .file_name("answer.wav")
            .mime_str("audio/wav")
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let form = Form::new()
            .part("audio", part)
            .text("drawing_id", drawing_id.to_string())
            .text("question_id", question_id.to_string());

        let response = self
            .client
            .post(self.url("/transcribe-answer"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let wire: TranscribeWire = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        wire.try_into()
    }
}
