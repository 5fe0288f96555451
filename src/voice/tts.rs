//! Text-to-speech (TTS) processing

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::SynthesisPort;
use super::playback::AudioPlayback;
use crate::error::SynthesisError;
use crate::{Error, Result};

/// Synthesizes speech with the OpenAI TTS API and plays it locally
pub struct OpenAiSpeaker {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    voice: String,
    speed: f32,
}

impl OpenAiSpeaker {
    /// Create a speaker
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: &SecretString,
        base_url: &str,
        model: String,
        voice: String,
        speed: f32,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key: SecretString::from(api_key.expose_secret().to_string()),
            endpoint: format!("{base_url}/audio/speech"),
            model,
            voice,
            speed,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request or the API fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SynthesisPort for OpenAiSpeaker {
    async fn speak(&self, text: &str) -> std::result::Result<(), SynthesisError> {
        let mp3 = self.synthesize(text).await?;
        tracing::debug!(bytes = mp3.len(), "speech synthesized");

        tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&mp3))
            .await
            .map_err(|e| SynthesisError(format!("playback task failed: {e}")))?
            .map_err(SynthesisError::from)
    }
}

/// Offline speech through a local synthesizer program
pub struct SystemSpeaker {
    program: PathBuf,
    rate: u32,
}

impl SystemSpeaker {
    /// Programs tried in order
    const CANDIDATES: &'static [&'static str] = &["espeak-ng", "espeak", "say"];

    /// Locate a synthesizer on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if none of `espeak-ng`, `espeak` or `say` is installed
    pub fn detect(rate: u32) -> Result<Self> {
        Self::CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|program| {
                tracing::debug!(program = %program.display(), rate, "using system speech");
                Self { program, rate }
            })
            .ok_or_else(|| {
                Error::Tts("no system speech program found (install espeak-ng)".to_string())
            })
    }

    /// Use a specific program
    #[must_use]
    pub const fn with_program(program: PathBuf, rate: u32) -> Self {
        Self { program, rate }
    }

    /// Command-line arguments for one utterance
    fn args(&self, text: &str) -> Vec<String> {
        let is_say = self
            .program
            .file_stem()
            .is_some_and(|stem| stem == "say");
        let rate_flag = if is_say { "-r" } else { "-s" };
        // Text after "--" is never read as an option
        vec![
            rate_flag.to_string(),
            self.rate.to_string(),
            "--".to_string(),
            text.to_string(),
        ]
    }
}

#[async_trait]
impl SynthesisPort for SystemSpeaker {
    async fn speak(&self, text: &str) -> std::result::Result<(), SynthesisError> {
        let status = tokio::process::Command::new(&self.program)
            .args(self.args(text))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| SynthesisError(format!("failed to run {}: {e}", self.program.display())))?;

        if status.success() {
            Ok(())
        } else {
            Err(SynthesisError(format!(
                "{} exited with {status}",
                self.program.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_flag_per_program() {
        let espeak = SystemSpeaker::with_program(PathBuf::from("/usr/bin/espeak-ng"), 150);
        assert_eq!(espeak.args("hi"), ["-s", "150", "--", "hi"]);

        let say = SystemSpeaker::with_program(PathBuf::from("/usr/bin/say"), 180);
        assert_eq!(say.args("hi"), ["-r", "180", "--", "hi"]);
    }

    #[test]
    fn test_leading_dash_text_is_not_an_option() {
        let espeak = SystemSpeaker::with_program(PathBuf::from("espeak"), 150);
        let args = espeak.args("-1 is returned when no pair exists.");
        assert_eq!(args.len(), 4);
        assert_eq!(args[2], "--");
        assert_eq!(args[3], "-1 is returned when no pair exists.");
    }

    #[tokio::test]
    async fn test_failing_program_is_synthesis_error() {
        let speaker = SystemSpeaker::with_program(PathBuf::from("false"), 150);
        assert!(speaker.speak("hello").await.is_err());
    }

    #[test]
    fn test_openai_requires_key() {
        let empty = SecretString::from(String::new());
        assert!(
            OpenAiSpeaker::new(
                &empty,
                "https://api.openai.com/v1",
                "tts-1".into(),
                "alloy".into(),
                1.0
            )
            .is_err()
        );
    }
}
