//! Configuration management for voice-qa
//!
//! Precedence is CLI > environment > TOML file > default. A `.env` file in
//! the working directory is loaded into the environment first.

pub mod file;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

pub use file::ConfigFile;

use crate::leetcode::{PlatformCredential, Site};
use crate::{Error, Result};

/// Default OpenAI-compatible API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default MCP server command
pub const DEFAULT_MCP_COMMAND: &[&str] = &["npx", "-y", "@jinzcdev/leetcode-mcp-server"];

/// Whisper model size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    /// Size name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Model identifier sent to the transcription endpoint
    ///
    /// The hosted OpenAI endpoint only serves `whisper-1`; self-hosted
    /// OpenAI-compatible servers take a faster-whisper model name.
    #[must_use]
    pub fn model_id(self, self_hosted: bool) -> String {
        if self_hosted {
            format!("Systran/faster-whisper-{}", self.as_str())
        } else {
            "whisper-1".to_string()
        }
    }
}

impl FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "base" => Ok(Self::Base),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!(
                "unknown whisper model: {other} (expected tiny, base, small, medium or large)"
            )),
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which speech synthesizer to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsBackend {
    /// OpenAI TTS played through the default output device
    OpenAi,
    /// Local `espeak-ng`, `espeak` or `say`
    System,
}

impl FromStr for TtsBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "system" | "espeak" | "local" => Ok(Self::System),
            other => Err(format!("unknown TTS backend: {other} (expected openai or system)")),
        }
    }
}

/// Language-model backend configuration
#[derive(Debug)]
pub struct BackendConfig {
    /// API key; no key means answers always use the local fallback
    pub api_key: Option<SecretString>,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Chat model
    pub model: String,
    /// Completion length cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

/// LeetCode access configuration
#[derive(Debug)]
pub struct PlatformConfig {
    /// Session cookie, when the user supplied one
    pub credential: Option<PlatformCredential>,
    /// Username for profile and submission questions
    pub username: Option<String>,
    /// Site to query
    pub site: Site,
    /// Try the MCP server before GraphQL
    pub mcp_enabled: bool,
    /// MCP server command and arguments
    pub mcp_command: Vec<String>,
    /// Timeout for MCP server startup (covers `npx` installs)
    pub mcp_startup_timeout: Duration,
    /// Timeout for individual lookups
    pub request_timeout: Duration,
    /// Lookup cache TTL, `None` disables caching
    pub cache_ttl: Option<Duration>,
}

/// Audio and speech configuration
#[derive(Debug)]
pub struct VoiceConfig {
    /// Recording length per turn
    pub capture_duration: Duration,
    /// Whisper model size
    pub whisper_model: WhisperModel,
    /// Self-hosted STT base URL, `None` uses the backend base URL
    pub stt_base_url: Option<String>,
    /// Speech synthesizer
    pub tts: TtsBackend,
    /// TTS model for the OpenAI synthesizer
    pub tts_model: String,
    /// TTS voice for the OpenAI synthesizer
    pub tts_voice: String,
    /// TTS speed multiplier
    pub tts_speed: f32,
    /// Words per minute for the system synthesizer
    pub speech_rate: u32,
}

/// Turn loop configuration
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Consecutive failed transcriptions before a spoken warning
    pub transcription_failure_threshold: u32,
    /// Consecutive fallback answers before a logged warning
    pub answer_failure_threshold: u32,
    /// Stop after this many turns
    pub max_turns: Option<u64>,
}

/// Command-line values that override every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Explicit config file; parse errors are fatal
    pub config_path: Option<PathBuf>,
    /// Recording length in seconds
    pub capture_secs: Option<u64>,
    /// Whisper model size
    pub whisper_model: Option<WhisperModel>,
    /// Turn limit
    pub max_turns: Option<u64>,
}

/// voice-qa configuration
#[derive(Debug)]
pub struct Config {
    /// Language-model backend
    pub backend: BackendConfig,
    /// LeetCode access
    pub platform: PlatformConfig,
    /// Audio and speech
    pub voice: VoiceConfig,
    /// Turn loop
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from `.env`, the environment, the config file and
    /// command-line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file cannot be loaded or a
    /// value is invalid
    pub fn load(overrides: &Overrides) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!(error = %e, "failed to load .env file");
        }

        let fc = match &overrides.config_path {
            Some(path) => file::load_from(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok(), overrides)
    }

    /// Build configuration from explicit sources
    ///
    /// `env` looks up environment variables; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is invalid
    pub fn from_sources(
        fc: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let base_url = var("OPENAI_BASE_URL")
            .or(fc.backend.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid backend base URL {base_url}: {e}")))?;

        let api_key = var("OPENAI_API_KEY")
            .or(fc.backend.api_key)
            .map(SecretString::from);

        let backend = BackendConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: var("VOICE_QA_LLM_MODEL")
                .or(fc.backend.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: fc.backend.max_tokens.unwrap_or(150),
            temperature: fc.backend.temperature.unwrap_or(0.7),
            timeout: Duration::from_secs(fc.backend.timeout_secs.unwrap_or(30)),
            api_key,
        };

        let site = var("LEETCODE_SITE")
            .or(fc.leetcode.site)
            .map(|s| s.parse::<Site>())
            .transpose()
            .map_err(Error::Config)?
            .unwrap_or_default();

        let mcp_command = var("VOICE_QA_MCP_COMMAND")
            .map(|s| s.split_whitespace().map(String::from).collect())
            .or(fc.leetcode.mcp_command)
            .unwrap_or_else(|| DEFAULT_MCP_COMMAND.iter().map(ToString::to_string).collect());

        let platform = PlatformConfig {
            credential: var("LEETCODE_SESSION")
                .or(fc.leetcode.session)
                .and_then(PlatformCredential::new),
            username: var("LEETCODE_USERNAME").or(fc.leetcode.username),
            site,
            mcp_enabled: var("VOICE_QA_MCP")
                .map(|v| {
                    !matches!(
                        v.trim().to_ascii_lowercase().as_str(),
                        "0" | "false" | "off" | "no"
                    )
                })
                .or(fc.leetcode.mcp)
                .unwrap_or(true),
            mcp_command,
            mcp_startup_timeout: Duration::from_secs(
                fc.leetcode.mcp_startup_timeout_secs.unwrap_or(60),
            ),
            request_timeout: Duration::from_secs(fc.leetcode.timeout_secs.unwrap_or(30)),
            cache_ttl: var("VOICE_QA_PROVIDER_CACHE_SECS")
                .and_then(|s| s.parse().ok())
                .or(fc.leetcode.cache_ttl_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        let whisper_model = match overrides.whisper_model {
            Some(model) => model,
            None => var("VOICE_QA_WHISPER_MODEL")
                .or(fc.voice.whisper_model)
                .map(|s| s.parse::<WhisperModel>())
                .transpose()
                .map_err(Error::Config)?
                .unwrap_or_default(),
        };

        let tts = var("VOICE_QA_TTS")
            .or(fc.voice.tts)
            .map(|s| s.parse::<TtsBackend>())
            .transpose()
            .map_err(Error::Config)?
            .unwrap_or(if backend.api_key.is_some() {
                TtsBackend::OpenAi
            } else {
                TtsBackend::System
            });

        let capture_secs = overrides
            .capture_secs
            .or_else(|| var("VOICE_QA_CAPTURE_SECS").and_then(|s| s.parse().ok()))
            .or(fc.voice.capture_secs)
            .unwrap_or(5)
            .max(1);

        let voice = VoiceConfig {
            capture_duration: Duration::from_secs(capture_secs),
            whisper_model,
            stt_base_url: var("VOICE_QA_STT_URL")
                .or(fc.voice.stt_url)
                .map(|u| u.trim_end_matches('/').to_string()),
            tts,
            tts_model: fc.voice.tts_model.unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: var("VOICE_QA_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
            speech_rate: fc.voice.speech_rate.unwrap_or(150),
        };

        let session = SessionConfig {
            transcription_failure_threshold: fc
                .session
                .transcription_failure_threshold
                .unwrap_or(3)
                .max(1),
            answer_failure_threshold: fc.session.answer_failure_threshold.unwrap_or(3).max(1),
            max_turns: overrides.max_turns.or(fc.session.max_turns),
        };

        Ok(Self {
            backend,
            platform,
            voice,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_sources(ConfigFile::default(), env_from(&[]), &Overrides::default())
                .unwrap();

        assert!(config.backend.api_key.is_none());
        assert_eq!(config.backend.model, DEFAULT_MODEL);
        assert_eq!(config.backend.max_tokens, 150);
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert!(config.platform.credential.is_none());
        assert_eq!(config.platform.site, Site::Global);
        assert!(config.platform.mcp_enabled);
        assert_eq!(config.platform.mcp_command[0], "npx");
        assert_eq!(config.platform.mcp_startup_timeout, Duration::from_secs(60));
        assert!(config.platform.cache_ttl.is_none());
        assert_eq!(config.voice.capture_duration, Duration::from_secs(5));
        assert_eq!(config.voice.tts, TtsBackend::System);
        assert_eq!(config.voice.speech_rate, 150);
        assert_eq!(config.session.transcription_failure_threshold, 3);
        assert!(config.session.max_turns.is_none());
    }

    #[test]
    fn test_env_over_file_and_cli_over_env() {
        let mut fc = ConfigFile::default();
        fc.backend.model = Some("file-model".to_string());
        fc.voice.capture_secs = Some(8);
        fc.leetcode.site = Some("global".to_string());

        let env = env_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("VOICE_QA_LLM_MODEL", "env-model"),
            ("VOICE_QA_CAPTURE_SECS", "4"),
            ("LEETCODE_SITE", "cn"),
            ("LEETCODE_SESSION", "cookie"),
            ("VOICE_QA_MCP_COMMAND", "node ./server.js --stdio"),
        ]);
        let overrides = Overrides {
            capture_secs: Some(2),
            whisper_model: Some(WhisperModel::Small),
            max_turns: Some(10),
            ..Overrides::default()
        };

        let config = Config::from_sources(fc, env, &overrides).unwrap();
        assert_eq!(config.backend.model, "env-model");
        assert_eq!(
            config.backend.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-test".to_string())
        );
        assert_eq!(config.voice.capture_duration, Duration::from_secs(2));
        assert_eq!(config.voice.whisper_model, WhisperModel::Small);
        assert_eq!(config.voice.tts, TtsBackend::OpenAi);
        assert_eq!(config.platform.site, Site::Cn);
        assert_eq!(
            config.platform.credential.as_ref().map(PlatformCredential::expose),
            Some("cookie")
        );
        assert_eq!(config.platform.mcp_command, ["node", "./server.js", "--stdio"]);
        assert_eq!(config.session.max_turns, Some(10));
    }

    #[test]
    fn test_blank_env_counts_as_unset() {
        let env = env_from(&[("OPENAI_API_KEY", "  "), ("LEETCODE_SESSION", "")]);
        let config =
            Config::from_sources(ConfigFile::default(), env, &Overrides::default()).unwrap();
        assert!(config.backend.api_key.is_none());
        assert!(config.platform.credential.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let env = env_from(&[("LEETCODE_SITE", "mars")]);
        assert!(matches!(
            Config::from_sources(ConfigFile::default(), env, &Overrides::default()),
            Err(Error::Config(_))
        ));

        let env = env_from(&[("OPENAI_BASE_URL", "not a url")]);
        assert!(matches!(
            Config::from_sources(ConfigFile::default(), env, &Overrides::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_mcp_can_be_disabled() {
        let env = env_from(&[("VOICE_QA_MCP", "off")]);
        let config =
            Config::from_sources(ConfigFile::default(), env, &Overrides::default()).unwrap();
        assert!(!config.platform.mcp_enabled);
    }

    #[test]
    fn test_mcp_switch_ignores_case() {
        for value in ["OFF", "False", " No ", "0"] {
            let env = env_from(&[("VOICE_QA_MCP", value)]);
            let config =
                Config::from_sources(ConfigFile::default(), env, &Overrides::default()).unwrap();
            assert!(!config.platform.mcp_enabled, "{value:?} should disable MCP");
        }

        let env = env_from(&[("VOICE_QA_MCP", "ON")]);
        let config =
            Config::from_sources(ConfigFile::default(), env, &Overrides::default()).unwrap();
        assert!(config.platform.mcp_enabled);
    }

    #[test]
    fn test_whisper_model_ids() {
        assert_eq!(WhisperModel::Base.model_id(false), "whisper-1");
        assert_eq!(
            WhisperModel::Medium.model_id(true),
            "Systran/faster-whisper-medium"
        );
        assert_eq!("LARGE".parse::<WhisperModel>().unwrap(), WhisperModel::Large);
    }
}
