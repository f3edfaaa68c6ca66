// Integration tests for the media capture adapter

mod common;

use std::sync::Arc;

use draw_and_tell::{
    AnswerRecorder, AudioFrame, MediaBackend, MediaError, ScriptedMedia,
};

fn frame(samples: Vec<i16>, timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

#[tokio::test]
async fn recorder_preserves_arrival_order() {
    let media = Arc::new(ScriptedMedia::new());
    media.set_frames(vec![
        frame(vec![1, 2], 0),
        frame(vec![3, 4], 100),
        frame(vec![5, 6], 200),
    ]);

    let microphone = media.open_microphone().await.expect("microphone opens");
    let recorder = AnswerRecorder::start(microphone, 16000, 1)
        .await
        .expect("recording starts");

    let blob = recorder.stop().await.expect("recording finalizes");

    assert_eq!(blob.samples, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(blob.sample_rate, 16000);
    assert_eq!(blob.channels, 1);
    assert_eq!(media.mic_closes(), 1, "stop releases the device");
}

#[tokio::test]
async fn zero_frames_finalize_to_a_valid_empty_blob() {
    let media = Arc::new(ScriptedMedia::new());
    media.set_frames(Vec::new());

    let microphone = media.open_microphone().await.expect("microphone opens");
    let recorder = AnswerRecorder::start(microphone, 16000, 1)
        .await
        .expect("recording starts");

    let blob = recorder.stop().await.expect("empty recording is not an error");

    assert!(blob.is_empty());
    assert_eq!(blob.duration_ms(), 0);

    // An empty blob still encodes to an uploadable WAV
    let wav = blob.to_wav_bytes().expect("empty blob encodes");
    let reader = hound::WavReader::new(std::io::Cursor::new(wav)).expect("valid wav");
    assert_eq!(reader.len(), 0);
}

#[tokio::test]
async fn device_reported_failure_still_releases_the_microphone() {
    let media = Arc::new(ScriptedMedia::new());
    media.set_frames(vec![frame(vec![7, 8], 0)]);
    media.fail_recording(true);

    let microphone = media.open_microphone().await.expect("microphone opens");
    let recorder = AnswerRecorder::start(microphone, 16000, 1)
        .await
        .expect("recording starts");

    let err = recorder.stop().await.expect_err("device failure surfaces");
    assert!(matches!(err, MediaError::RecordingEmpty));
    assert_eq!(media.mic_closes(), 1, "released on the error path too");
}

#[tokio::test]
async fn failed_start_still_releases_the_microphone() {
    let media = Arc::new(ScriptedMedia::new());
    media.fail_start(true);

    let microphone = media.open_microphone().await.expect("microphone opens");
    let err = AnswerRecorder::start(microphone, 16000, 1)
        .await
        .expect_err("stream failure surfaces");

    assert!(matches!(err, MediaError::CaptureFailed(_)));
    assert_eq!(media.mic_closes(), 1, "released before the failure is reported");
}

#[tokio::test]
async fn abort_releases_the_microphone_and_discards_audio() {
    let media = Arc::new(ScriptedMedia::new());
    media.set_frames(vec![frame(vec![9, 10], 0)]);

    let microphone = media.open_microphone().await.expect("microphone opens");
    let recorder = AnswerRecorder::start(microphone, 16000, 1)
        .await
        .expect("recording starts");

    recorder.abort().await;
    assert_eq!(media.mic_closes(), 1);
}

#[tokio::test]
async fn camera_close_is_idempotent() {
    let media = ScriptedMedia::new();
    media.set_image(b"img".to_vec());

    let mut camera = media.open_camera().await.expect("camera opens");
    let image = camera.capture_still().await.expect("capture succeeds");
    assert_eq!(image.bytes, b"img");
    assert_eq!(image.mime, "image/png");

    camera.close().await;
    camera.close().await;
    assert_eq!(media.camera_closes(), 1);
}

#[tokio::test]
async fn denied_devices_report_device_unavailable() {
    let media = ScriptedMedia::new();
    media.deny_camera(true);
    media.deny_microphone(true);

    let camera_err = media.open_camera().await.err().expect("camera denied");
    assert!(matches!(camera_err, MediaError::DeviceUnavailable(_)));

    let mic_err = media.open_microphone().await.err().expect("microphone denied");
    assert!(matches!(mic_err, MediaError::DeviceUnavailable(_)));
}

#[test]
fn recorded_blob_encodes_to_16_bit_wav() {
    let blob = draw_and_tell::AudioBlob {
        samples: vec![100, -100, 2000, -2000],
        sample_rate: 16000,
        channels: 1,
    };

    let wav = blob.to_wav_bytes().expect("encodes");
    let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).expect("valid wav");
    let spec = reader.spec();

    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![100, -100, 2000, -2000]);
}
