use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::state::{ErrorInfo, SessionState, Stage};
use crate::config::AudioConfig;
use crate::gateway::InferenceGateway;
use crate::media::{AnswerRecorder, MediaBackend};
use crate::playback::{
    AudioSink, PlaybackController, PlaybackEvent, PlaybackOutcome,
};

/// Sequences one child session through the capture → analyze → answer →
/// respond lifecycle.
///
/// All transition methods take `&mut self`: a transition only fires after its
/// triggering async operation resolves, and no second operation can start
/// while one is outstanding. A trigger arriving in the wrong stage is logged
/// and ignored, which is what makes rapid repeated user input harmless.
pub struct SessionFlow {
    session: SessionState,
    gateway: Arc<dyn InferenceGateway>,
    media: Arc<dyn MediaBackend>,
    playback: PlaybackController,
    playback_rx: mpsc::Receiver<PlaybackEvent>,
    recorder: Option<AnswerRecorder>,
    audio: AudioConfig,
}

impl SessionFlow {
    pub fn new(
        gateway: Arc<dyn InferenceGateway>,
        media: Arc<dyn MediaBackend>,
        sink: Arc<dyn AudioSink>,
        audio: AudioConfig,
    ) -> Self {
        let (playback, playback_rx) = PlaybackController::new(sink);
        Self {
            session: SessionState::new(),
            gateway,
            media,
            playback,
            playback_rx,
            recorder: None,
            audio,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stage(&self) -> Stage {
        self.session.stage
    }

    /// Apply pending playback notifications to the session record.
    ///
    /// Playback failure is non-fatal: it only updates `last_error`. Events for
    /// payloads that no longer belong to this session (superseded, or left
    /// over from before a restart) are discarded.
    pub fn drain_playback_events(&mut self) {
        while let Ok(event) = self.playback_rx.try_recv() {
            let belongs_here = self
                .session
                .question_audio
                .as_ref()
                .map(|a| a.id == event.payload)
                .unwrap_or(false)
                || self
                    .session
                    .response_audio
                    .as_ref()
                    .map(|a| a.id == event.payload)
                    .unwrap_or(false);

            if !belongs_here {
                info!("Discarding stale playback event for {}", event.payload);
                continue;
            }

            if let PlaybackOutcome::Failed(e) = event.outcome {
                warn!("Session continues without audio: {}", e);
                self.session.last_error = Some(ErrorInfo::from_playback(&e));
            }
        }
    }

    /// Prompting entry action: fetch a drawing prompt. Retry is simply
    /// calling this again; each call yields an independent prompt.
    pub async fn fetch_prompt(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::Prompting {
            warn!("fetch_prompt ignored in stage {}", self.session.stage);
            return self.session.stage;
        }

        match self.gateway.get_prompt().await {
            Ok(reply) => {
                info!("Prompt ready: {}", reply.prompt);
                self.session.prompt = Some(reply.prompt);
                self.session.last_error = None;
            }
            Err(e) => {
                warn!("Prompt fetch failed: {}", e);
                self.session.last_error = Some(ErrorInfo::from_service(&e));
            }
        }
        self.session.stage
    }

    /// User starts drawing: Prompting → Capturing
    pub fn start_drawing(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::Prompting || self.session.prompt.is_none() {
            warn!("start_drawing ignored in stage {}", self.session.stage);
            return self.session.stage;
        }
        self.transition(Stage::Capturing);
        self.session.stage
    }

    /// Capturing entry action: acquire the camera, sample one still frame,
    /// release the camera on both paths, then hand the image to analysis.
    /// Any device failure keeps the session in Capturing for a retake.
    pub async fn capture_drawing(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::Capturing {
            warn!("capture_drawing ignored in stage {}", self.session.stage);
            return self.session.stage;
        }

        let mut camera = match self.media.open_camera().await {
            Ok(camera) => camera,
            Err(e) => {
                warn!("Camera unavailable: {}", e);
                self.session.last_error = Some(ErrorInfo::from_media(&e));
                return self.session.stage;
            }
        };

        let shot = camera.capture_still().await;
        // The device never survives past the capture stage
        camera.close().await;

        let image = match shot {
            Ok(image) => image,
            Err(e) => {
                warn!("Capture failed: {}", e);
                self.session.last_error = Some(ErrorInfo::from_media(&e));
                return self.session.stage;
            }
        };

        self.session.captured_image = Some(image);
        self.transition(Stage::Analyzing);
        self.analyze().await
    }

    async fn analyze(&mut self) -> Stage {
        let prompt = match self.session.prompt.clone() {
            Some(prompt) => prompt,
            None => {
                // Cannot happen through the public transitions; full restart required
                self.session.last_error =
                    Some(ErrorInfo::internal("session lost its prompt before analysis"));
                self.transition(Stage::Failed);
                return self.session.stage;
            }
        };
        let image = match self.session.captured_image.as_ref() {
            Some(image) => image,
            None => {
                self.session.last_error =
                    Some(ErrorInfo::internal("session lost its image before analysis"));
                self.transition(Stage::Failed);
                return self.session.stage;
            }
        };

        match self.gateway.analyze_drawing(image, &prompt).await {
            Ok(reply) => {
                debug_assert!(
                    self.session.drawing_id.is_none() && self.session.question_id.is_none(),
                    "drawing/question ids bind exactly once per session"
                );
                info!(
                    "Drawing {} analyzed, question {}: {}",
                    reply.drawing_id, reply.question_id, reply.question_text
                );
                self.session.drawing_id = Some(reply.drawing_id);
                self.session.question_id = Some(reply.question_id);
                self.session.question_text = Some(reply.question_text);
                self.session.question_audio = reply.question_audio;
                self.session.last_error = None;
                self.transition(Stage::AwaitingAnswer);

                // Text-only when no spoken question was delivered
                if let Some(audio) = self.session.question_audio.clone() {
                    self.playback.play(audio);
                }
            }
            Err(e) => {
                warn!("Analysis failed, returning to capture: {}", e);
                self.session.last_error = Some(ErrorInfo::from_service(&e));
                self.session.captured_image = None;
                self.transition(Stage::Capturing);
            }
        }
        self.session.stage
    }

    /// User starts answering: AwaitingAnswer → Recording.
    /// A device error reverts to AwaitingAnswer with no partial audio kept.
    pub async fn begin_answer(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::AwaitingAnswer {
            warn!("begin_answer ignored in stage {}", self.session.stage);
            return self.session.stage;
        }

        let microphone = match self.media.open_microphone().await {
            Ok(microphone) => microphone,
            Err(e) => {
                warn!("Microphone unavailable: {}", e);
                self.session.last_error = Some(ErrorInfo::from_media(&e));
                return self.session.stage;
            }
        };

        match AnswerRecorder::start(microphone, self.audio.sample_rate, self.audio.channels).await
        {
            Ok(recorder) => {
                self.recorder = Some(recorder);
                self.transition(Stage::Recording);
            }
            Err(e) => {
                warn!("Recording start failed: {}", e);
                self.session.last_error = Some(ErrorInfo::from_media(&e));
            }
        }
        self.session.stage
    }

    /// User abandons the answer: Recording → AwaitingAnswer, buffer discarded
    pub async fn abort_answer(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::Recording {
            warn!("abort_answer ignored in stage {}", self.session.stage);
            return self.session.stage;
        }
        if let Some(recorder) = self.recorder.take() {
            recorder.abort().await;
        }
        self.transition(Stage::AwaitingAnswer);
        self.session.stage
    }

    /// User stops answering: Recording → Submitting → Responding/Finished.
    ///
    /// An empty recording is still submitted — the collaborator decides what
    /// silence yields. A submit failure discards the recording entirely; a
    /// fresh one is required before resubmission.
    pub async fn finish_answer(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::Recording {
            warn!("finish_answer ignored in stage {}", self.session.stage);
            return self.session.stage;
        }

        let recorder = match self.recorder.take() {
            Some(recorder) => recorder,
            None => {
                self.session.last_error =
                    Some(ErrorInfo::internal("recording stage without a recorder"));
                self.transition(Stage::Failed);
                return self.session.stage;
            }
        };

        let blob = match recorder.stop().await {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Recording finalize failed: {}", e);
                self.session.last_error = Some(ErrorInfo::from_media(&e));
                self.transition(Stage::AwaitingAnswer);
                return self.session.stage;
            }
        };

        let (drawing_id, question_id) =
            match (self.session.drawing_id, self.session.question_id) {
                (Some(d), Some(q)) => (d, q),
                _ => {
                    self.session.last_error = Some(ErrorInfo::internal(
                        "session lost its drawing/question identifiers",
                    ));
                    self.transition(Stage::Failed);
                    return self.session.stage;
                }
            };

        self.session.answer_audio = Some(blob.clone());
        self.transition(Stage::Submitting);

        match self.gateway.transcribe_answer(&blob, drawing_id, question_id).await {
            Ok(reply) => {
                self.session.answer_audio = None;
                self.session.last_error = None;
                info!("Answer transcribed: {:?}", reply.transcript);

                match reply.response_text {
                    Some(text) => {
                        self.session.response_text = Some(text);
                        self.session.response_audio = reply.response_audio;
                        self.transition(Stage::Responding);
                        if let Some(audio) = self.session.response_audio.clone() {
                            self.playback.play(audio);
                        }
                    }
                    None => {
                        // No follow-up generated; the session simply ends
                        self.transition(Stage::Finished);
                    }
                }
            }
            Err(e) => {
                warn!("Submission failed, answer discarded: {}", e);
                self.session.answer_audio = None;
                self.session.last_error = Some(ErrorInfo::from_service(&e));
                self.transition(Stage::AwaitingAnswer);
            }
        }
        self.session.stage
    }

    /// User continues past the response: Responding → Finished
    pub fn acknowledge_response(&mut self) -> Stage {
        self.drain_playback_events();
        if self.session.stage != Stage::Responding {
            warn!("acknowledge_response ignored in stage {}", self.session.stage);
            return self.session.stage;
        }
        self.transition(Stage::Finished);
        self.session.stage
    }

    /// Discard the session record and start over from Prompting
    pub async fn restart(&mut self) -> Stage {
        self.teardown().await;
        info!("Session restarted");
        self.session = SessionState::new();
        self.session.stage
    }

    /// Release every held resource: recorder (microphone), playback.
    /// In-flight gateway calls are cancelled by dropping their futures;
    /// late playback events are discarded by the identity check in
    /// `drain_playback_events`.
    pub async fn teardown(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.abort().await;
        }
        self.playback.stop();
        // Flush anything queued before the stop
        while self.playback_rx.try_recv().is_ok() {}
    }

    fn transition(&mut self, to: Stage) {
        info!(
            "Session {} stage: {} -> {}",
            self.session.session_id, self.session.stage, to
        );
        self.session.stage = to;
    }
}
