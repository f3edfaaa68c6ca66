use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Collaborator failure: HTTP-style status plus a message. Never interpreted
/// beyond success/failure; every gateway operation is safe to re-invoke with
/// unchanged inputs after one of these.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected reply: {0}")]
    Malformed(String),
}

/// Identity of one audio delivery, used to deduplicate playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadId(Uuid);

impl PayloadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PayloadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PayloadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One delivered speech payload (question or response), decoded from the
/// base64 the service sends. Each delivery gets a fresh identity.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub id: PayloadId,
    pub wav: Vec<u8>,
}

impl AudioPayload {
    pub fn from_wav(wav: Vec<u8>) -> Self {
        Self {
            id: PayloadId::new(),
            wav,
        }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, ServiceError> {
        let wav = BASE64
            .decode(encoded)
            .map_err(|e| ServiceError::Malformed(format!("audio payload: {}", e)))?;
        Ok(Self::from_wav(wav))
    }
}

#[derive(Debug, Clone)]
pub struct PromptReply {
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct AnalyzeReply {
    pub question_text: String,
    pub drawing_id: i64,
    pub question_id: i64,
    /// Absent means no spoken question is available; the flow proceeds text-only
    pub question_audio: Option<AudioPayload>,
}

#[derive(Debug, Clone)]
pub struct TranscribeReply {
    pub transcript: String,
    pub confidence: f32,
    /// Absent is a valid terminal outcome: no follow-up was generated
    pub response_text: Option<String>,
    pub response_audio: Option<AudioPayload>,
}

// ============================================================================
// Wire formats (as the service sends them)
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct PromptWire {
    pub prompt: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeWire {
    pub question: String,
    /// Stringified integer on the wire
    #[serde(default)]
    pub drawing_id: Option<String>,
    #[serde(default)]
    pub question_id: Option<String>,
    /// Base64-encoded single-channel WAV
    #[serde(default)]
    pub question_audio: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranscribeWire {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub response_audio: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TryFrom<PromptWire> for PromptReply {
    type Error = ServiceError;

    fn try_from(wire: PromptWire) -> Result<Self, ServiceError> {
        if let Some(error) = wire.error {
            return Err(ServiceError::Malformed(error));
        }
        Ok(PromptReply {
            prompt: wire.prompt,
        })
    }
}

impl TryFrom<AnalyzeWire> for AnalyzeReply {
    type Error = ServiceError;

    fn try_from(wire: AnalyzeWire) -> Result<Self, ServiceError> {
        // The service reports its own failures in-band, with null ids
        if let Some(error) = wire.error {
            return Err(ServiceError::Malformed(error));
        }

        let drawing_id = parse_id(wire.drawing_id.as_deref(), "drawingId")?;
        let question_id = parse_id(wire.question_id.as_deref(), "questionId")?;

        let question_audio = match wire.question_audio.as_deref() {
            Some(encoded) if !encoded.is_empty() => Some(AudioPayload::from_base64(encoded)?),
            _ => None,
        };

        Ok(AnalyzeReply {
            question_text: wire.question,
            drawing_id,
            question_id,
            question_audio,
        })
    }
}

impl TryFrom<TranscribeWire> for TranscribeReply {
    type Error = ServiceError;

    fn try_from(wire: TranscribeWire) -> Result<Self, ServiceError> {
        if let Some(error) = wire.error {
            return Err(ServiceError::Malformed(error));
        }

        let response_audio = match wire.response_audio.as_deref() {
            Some(encoded) if !encoded.is_empty() => Some(AudioPayload::from_base64(encoded)?),
            _ => None,
        };

        Ok(TranscribeReply {
            transcript: wire.transcript,
            confidence: wire.confidence,
            response_text: wire.response.filter(|text| !text.is_empty()),
            response_audio,
        })
    }
}

fn parse_id(value: Option<&str>, field: &str) -> Result<i64, ServiceError> {
    let value = value.ok_or_else(|| ServiceError::Malformed(format!("missing {}", field)))?;
    value
        .parse::<i64>()
        .map_err(|_| ServiceError::Malformed(format!("{} is not an integer: {:?}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_reply_parses_ids_and_audio() {
        let wav = BASE64.encode(b"RIFFdata");
        let json = format!(
            r#"{{"question":"What is your animal doing?","drawingId":"42","questionId":"7","questionAudio":"{}"}}"#,
            wav
        );
        let wire: AnalyzeWire = serde_json::from_str(&json).unwrap();
        let reply = AnalyzeReply::try_from(wire).unwrap();

        assert_eq!(reply.question_text, "What is your animal doing?");
        assert_eq!(reply.drawing_id, 42);
        assert_eq!(reply.question_id, 7);
        assert_eq!(reply.question_audio.unwrap().wav, b"RIFFdata");
    }

    #[test]
    fn analyze_reply_without_audio_is_text_only() {
        let json = r#"{"question":"Tell me more!","drawingId":"1","questionId":"2"}"#;
        let wire: AnalyzeWire = serde_json::from_str(json).unwrap();
        let reply = AnalyzeReply::try_from(wire).unwrap();

        assert!(reply.question_audio.is_none());
        assert_eq!(reply.question_text, "Tell me more!");
    }

    #[test]
    fn analyze_reply_with_missing_ids_is_malformed() {
        let json = r#"{"question":"Can you tell me about what you drew?"}"#;
        let wire: AnalyzeWire = serde_json::from_str(json).unwrap();
        let err = AnalyzeReply::try_from(wire).unwrap_err();

        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[test]
    fn analyze_reply_with_error_field_is_malformed() {
        let json =
            r#"{"question":"fallback","drawingId":null,"questionId":null,"error":"cv offline"}"#;
        let wire: AnalyzeWire = serde_json::from_str(json).unwrap();
        let err = AnalyzeReply::try_from(wire).unwrap_err();

        assert!(matches!(err, ServiceError::Malformed(message) if message == "cv offline"));
    }

    #[test]
    fn transcribe_reply_without_response_is_terminal() {
        let json = r#"{"transcript":"a dog","confidence":0.9}"#;
        let wire: TranscribeWire = serde_json::from_str(json).unwrap();
        let reply = TranscribeReply::try_from(wire).unwrap();

        assert_eq!(reply.transcript, "a dog");
        assert!(reply.response_text.is_none());
        assert!(reply.response_audio.is_none());
    }

    #[test]
    fn payload_identities_are_distinct_per_delivery() {
        let a = AudioPayload::from_wav(vec![1, 2, 3]);
        let b = AudioPayload::from_wav(vec![1, 2, 3]);
        assert_ne!(a.id, b.id);
    }
}
