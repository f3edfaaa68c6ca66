// Shared test doubles: a scripted inference gateway and a recording audio
// sink, used by the flow and playback integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use draw_and_tell::{
    AnalyzeReply, AudioBlob, AudioSink, CapturedImage, DecodedClip, InferenceGateway,
    PlaybackError, PromptReply, ServiceError, TranscribeReply,
};

/// Gateway double with scripted replies, consumed in order.
/// Running out of script yields a transport error.
pub struct FakeGateway {
    prompts: Mutex<VecDeque<Result<PromptReply, ServiceError>>>,
    analyses: Mutex<VecDeque<Result<AnalyzeReply, ServiceError>>>,
    transcriptions: Mutex<VecDeque<Result<TranscribeReply, ServiceError>>>,
    /// (sample count, drawing_id, question_id) per submission
    pub submissions: Mutex<Vec<(usize, i64, i64)>>,
    /// Prompt string sent with each analyze call
    pub analyzed_prompts: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(VecDeque::new()),
            analyses: Mutex::new(VecDeque::new()),
            transcriptions: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            analyzed_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_prompt(&self, reply: Result<PromptReply, ServiceError>) {
        self.prompts.lock().unwrap().push_back(reply);
    }

    pub fn push_analysis(&self, reply: Result<AnalyzeReply, ServiceError>) {
        self.analyses.lock().unwrap().push_back(reply);
    }

    pub fn push_transcription(&self, reply: Result<TranscribeReply, ServiceError>) {
        self.transcriptions.lock().unwrap().push_back(reply);
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    fn out_of_script() -> ServiceError {
        ServiceError::Transport("no scripted reply".to_string())
    }
}

#[async_trait::async_trait]
impl InferenceGateway for FakeGateway {
    async fn get_prompt(&self) -> Result<PromptReply, ServiceError> {
        self.prompts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::out_of_script()))
    }

    async fn analyze_drawing(
        &self,
        _image: &CapturedImage,
        prompt: &str,
    ) -> Result<AnalyzeReply, ServiceError> {
        self.analyzed_prompts.lock().unwrap().push(prompt.to_string());
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::out_of_script()))
    }

    async fn transcribe_answer(
        &self,
        audio: &AudioBlob,
        drawing_id: i64,
        question_id: i64,
    ) -> Result<TranscribeReply, ServiceError> {
        self.submissions
            .lock()
            .unwrap()
            .push((audio.samples.len(), drawing_id, question_id));
        self.transcriptions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::out_of_script()))
    }
}

/// Sink that counts plays and renders each clip as a fixed delay
pub struct TestSink {
    pub delay: Duration,
    pub fail: AtomicBool,
    pub plays: AtomicUsize,
}

impl TestSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: AtomicBool::new(false),
            plays: AtomicUsize::new(0),
        }
    }

    pub fn instant() -> Self {
        Self::new(Duration::from_millis(0))
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AudioSink for TestSink {
    async fn play(&self, _clip: DecodedClip) -> Result<(), PlaybackError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlaybackError::Output("test sink failure".to_string()));
        }
        Ok(())
    }
}

/// Valid 16-bit mono WAV bytes for playback fixtures
pub fn wav_fixture(samples: &[i16]) -> Vec<u8> {
    AudioBlob {
        samples: samples.to_vec(),
        sample_rate: 16000,
        channels: 1,
    }
    .to_wav_bytes()
    .expect("fixture wav encodes")
}
