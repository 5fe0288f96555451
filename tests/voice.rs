//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::path::PathBuf;

use voice_qa::config::WhisperModel;
use voice_qa::error::TranscriptionError;
use voice_qa::voice::{
    AudioSample, MicrophoneTranscriber, SAMPLE_RATE, SynthesisPort, SystemSpeaker,
    TranscriptionPort, WhisperClient, samples_to_wav,
};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Transcriber pointed at a closed local port
fn unreachable_transcriber() -> MicrophoneTranscriber {
    let whisper = WhisperClient::new(
        "https://api.openai.com/v1",
        Some("http://127.0.0.1:9/v1"),
        None,
        WhisperModel::Tiny,
    )
    .unwrap();
    MicrophoneTranscriber::new(whisper)
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // WAV header is 44 bytes
    assert!(wav_data.len() > 44);
}

#[test]
fn test_sample_wav_keeps_rate_and_length() {
    let sample = AudioSample::new(vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25], SAMPLE_RATE);
    let wav_data = sample.to_wav().unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), sample.samples().len());
    assert_eq!(read_samples[3], i16::MAX);
}

#[test]
fn test_sample_energy() {
    let loud = AudioSample::new(generate_sine_samples(440.0, 0.5, 0.5), SAMPLE_RATE);
    let quiet = AudioSample::new(generate_silence(0.5), SAMPLE_RATE);

    // RMS of a sine is amplitude / sqrt(2)
    assert!((loud.rms() - 0.5 / 2f32.sqrt()).abs() < 0.01);
    assert!(quiet.rms().abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_silence_is_empty_without_network() {
    let transcriber = unreachable_transcriber();

    let result = transcriber
        .transcribe(AudioSample::new(generate_silence(1.0), SAMPLE_RATE))
        .await;

    assert!(matches!(result, Err(TranscriptionError::Empty)));
}

#[tokio::test]
async fn test_nothing_captured_is_empty() {
    let transcriber = unreachable_transcriber();

    let result = transcriber.transcribe(AudioSample::default()).await;

    assert!(matches!(result, Err(TranscriptionError::Empty)));
}

#[tokio::test]
async fn test_unreachable_engine_is_engine_error() {
    let transcriber = unreachable_transcriber();

    let result = transcriber
        .transcribe(AudioSample::new(
            generate_sine_samples(220.0, 0.5, 0.4),
            SAMPLE_RATE,
        ))
        .await;

    assert!(matches!(result, Err(TranscriptionError::Engine(_))));
}

#[tokio::test]
async fn test_missing_speech_program_fails_softly() {
    let speaker = SystemSpeaker::with_program(PathBuf::from("/nonexistent/espeak-ng"), 175);

    tokio_test::assert_err!(speaker.speak("hello").await);
}

#[cfg(unix)]
#[tokio::test]
async fn test_speech_program_success() {
    let speaker = SystemSpeaker::with_program(PathBuf::from("true"), 175);

    tokio_test::assert_ok!(speaker.speak("hello").await);
}
