//! TOML configuration file loading
//!
//! Supports `~/.config/voice-qa/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Language-model backend
    #[serde(default)]
    pub backend: BackendFileConfig,

    /// LeetCode access
    #[serde(default)]
    pub leetcode: LeetcodeFileConfig,

    /// Audio and speech
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Turn loop
    #[serde(default)]
    pub session: SessionFileConfig,
}

/// Backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct BackendFileConfig {
    /// API key (prefer `OPENAI_API_KEY`)
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL
    pub base_url: Option<String>,
    /// Chat model (e.g. "gpt-3.5-turbo")
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

/// LeetCode configuration
#[derive(Debug, Default, Deserialize)]
pub struct LeetcodeFileConfig {
    /// `LEETCODE_SESSION` cookie
    pub session: Option<String>,
    pub username: Option<String>,
    /// "global" or "cn"
    pub site: Option<String>,
    /// Try the MCP server before GraphQL
    pub mcp: Option<bool>,
    /// MCP server command and arguments
    pub mcp_command: Option<Vec<String>>,
    pub mcp_startup_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    /// Cache successful lookups for this long; unset disables the cache
    pub cache_ttl_secs: Option<u64>,
}

/// Voice configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Seconds recorded per turn
    pub capture_secs: Option<u64>,
    /// Whisper model size ("tiny" .. "large")
    pub whisper_model: Option<String>,
    /// Self-hosted OpenAI-compatible STT base URL
    pub stt_url: Option<String>,
    /// "openai" or "system"
    pub tts: Option<String>,
    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,
    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,
    pub tts_speed: Option<f32>,
    /// Words per minute for the system speaker
    pub speech_rate: Option<u32>,
}

/// Turn loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub transcription_failure_threshold: Option<u32>,
    pub answer_failure_threshold: Option<u32>,
    pub max_turns: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Load a config file from an explicit path
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_from(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/voice-qa/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-qa").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[backend]
model = "gpt-4o-mini"

[leetcode]
site = "cn"
mcp_command = ["node", "server.js"]

[session]
max_turns = 4
"#
        )
        .unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.backend.model.as_deref(), Some("gpt-4o-mini"));
        assert!(config.backend.api_key.is_none());
        assert_eq!(config.leetcode.site.as_deref(), Some("cn"));
        assert_eq!(
            config.leetcode.mcp_command,
            Some(vec!["node".to_string(), "server.js".to_string()])
        );
        assert_eq!(config.session.max_turns, Some(4));
        assert!(config.voice.capture_secs.is_none());
    }

    #[test]
    fn test_explicit_path_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nmodel = ").unwrap();
        assert!(matches!(load_from(file.path()), Err(crate::Error::Toml(_))));
    }
}
