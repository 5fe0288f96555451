//! Speech-to-text (STT) processing

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::TranscriptionPort;
use super::capture::{self, AudioSample};
use crate::config::WhisperModel;
use crate::error::TranscriptionError;
use crate::{Error, Result};

/// Below this RMS a recording is treated as silence
const SILENCE_RMS: f32 = 0.005;

/// Response from an OpenAI-compatible transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Client for an OpenAI-compatible `/audio/transcriptions` endpoint
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
    model: String,
}

impl WhisperClient {
    /// Create a client for the hosted API or a self-hosted server
    ///
    /// With `self_hosted_url` set the key is optional and the model size is
    /// passed through; otherwise `api_key` is required.
    ///
    /// # Errors
    ///
    /// Returns error if neither a key nor a self-hosted URL is available
    pub fn new(
        base_url: &str,
        self_hosted_url: Option<&str>,
        api_key: Option<&SecretString>,
        model: WhisperModel,
    ) -> Result<Self> {
        let api_key = api_key.map(|k| SecretString::from(k.expose_secret().to_string()));

        let (endpoint, model) = match self_hosted_url {
            Some(url) => (
                format!("{url}/audio/transcriptions"),
                model.model_id(true),
            ),
            None => {
                if api_key.is_none() {
                    return Err(Error::Config(
                        "speech-to-text needs OPENAI_API_KEY or VOICE_QA_STT_URL".to_string(),
                    ));
                }
                (
                    format!("{base_url}/audio/transcriptions"),
                    model.model_id(false),
                )
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model,
        })
    }

    /// Model identifier sent with each request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the request or the API fails
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), model = %self.model, "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "transcription request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

/// Records from the default microphone and transcribes with Whisper
pub struct MicrophoneTranscriber {
    whisper: WhisperClient,
}

impl MicrophoneTranscriber {
    /// Create a transcriber
    #[must_use]
    pub const fn new(whisper: WhisperClient) -> Self {
        Self { whisper }
    }
}

#[async_trait]
impl TranscriptionPort for MicrophoneTranscriber {
    type Sample = AudioSample;

    async fn capture(
        &self,
        duration: Duration,
    ) -> std::result::Result<AudioSample, TranscriptionError> {
        tracing::info!(seconds = duration.as_secs(), "listening");
        tokio::task::spawn_blocking(move || capture::record(duration))
            .await
            .map_err(|e| TranscriptionError::Capture(format!("capture task failed: {e}")))?
            .map_err(TranscriptionError::from)
    }

    async fn transcribe(
        &self,
        sample: AudioSample,
    ) -> std::result::Result<String, TranscriptionError> {
        if sample.is_empty() || sample.rms() < SILENCE_RMS {
            tracing::debug!(rms = sample.rms(), "recording is silent");
            return Err(TranscriptionError::Empty);
        }

        let wav = sample.to_wav()?;
        let text = self.whisper.transcribe(wav).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(TranscriptionError::Empty);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_requires_key() {
        let err = WhisperClient::new("https://api.openai.com/v1", None, None, WhisperModel::Base);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_model_selection() {
        let key = SecretString::from("sk-test".to_string());
        let hosted = WhisperClient::new(
            "https://api.openai.com/v1",
            None,
            Some(&key),
            WhisperModel::Large,
        )
        .unwrap();
        assert_eq!(hosted.model(), "whisper-1");

        let local = WhisperClient::new(
            "https://api.openai.com/v1",
            Some("http://localhost:8000/v1"),
            None,
            WhisperModel::Small,
        )
        .unwrap();
        assert_eq!(local.model(), "Systran/faster-whisper-small");
    }

    #[tokio::test]
    async fn test_silent_sample_is_empty_without_request() {
        let whisper = WhisperClient::new(
            "https://api.openai.com/v1",
            Some("http://127.0.0.1:9/v1"),
            None,
            WhisperModel::Base,
        )
        .unwrap();
        let transcriber = MicrophoneTranscriber::new(whisper);

        let silent = AudioSample::new(vec![0.0; 16_000], capture::SAMPLE_RATE);
        assert!(matches!(
            transcriber.transcribe(silent).await,
            Err(TranscriptionError::Empty)
        ));
    }
}
