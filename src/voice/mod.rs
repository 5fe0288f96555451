//! Voice input and output
//!
//! The orchestrator only sees the two ports defined here. Microphone capture
//! and speaker playback use cpal on blocking tasks; the console adapters
//! stand in when there is no audio hardware.

mod capture;
mod console;
mod playback;
mod stt;
mod tts;

use std::time::Duration;

use async_trait::async_trait;

pub use capture::{AudioCapture, AudioSample, SAMPLE_RATE, record, samples_to_wav};
pub use console::{ConsoleSpeaker, ConsoleTranscriber, TYPING_WARNING};
pub use playback::AudioPlayback;
pub use stt::{MicrophoneTranscriber, WhisperClient};
pub use tts::{OpenAiSpeaker, SystemSpeaker};

use crate::error::{SynthesisError, TranscriptionError};

/// Spoken when microphone transcription keeps failing
pub const HEARING_WARNING: &str =
    "I'm having trouble hearing you. Please check your microphone and speak clearly.";

/// Source of user utterances
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// One captured utterance, before transcription
    type Sample: Send;

    /// Capture one utterance, listening for at most `duration`
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::Capture`] if no audio could be acquired
    async fn capture(&self, duration: Duration) -> Result<Self::Sample, TranscriptionError>;

    /// Turn a captured utterance into text
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::Empty`] when nothing was said
    async fn transcribe(&self, sample: Self::Sample) -> Result<String, TranscriptionError>;

    /// Warning spoken after repeated failures, worded for this input
    fn hearing_warning(&self) -> &str {
        HEARING_WARNING
    }
}

/// Sink for spoken answers
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    /// Speak text, returning once playback finished
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError`] if synthesis or playback failed
    async fn speak(&self, text: &str) -> Result<(), SynthesisError>;
}

#[async_trait]
impl<S: SynthesisPort + ?Sized> SynthesisPort for Box<S> {
    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        (**self).speak(text).await
    }
}
