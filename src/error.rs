//! Error types for voice-qa
//!
//! [`Error`] covers setup and I/O plumbing. The collaborator errors below it
//! are the recoverable per-turn failures that never leave the turn loop.

use std::fmt;

use thiserror::Error;

/// Result type alias for voice-qa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or driving collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Capture or transcription failed, or produced nothing usable
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// Audio could not be captured
    #[error("capture failed: {0}")]
    Capture(String),

    /// Captured audio held no speech
    #[error("no speech in captured audio")]
    Empty,

    /// The speech-to-text engine failed
    #[error("transcription failed: {0}")]
    Engine(String),
}

impl From<Error> for TranscriptionError {
    fn from(err: Error) -> Self {
        match err {
            Error::Audio(msg) => Self::Capture(msg),
            other => Self::Engine(other.to_string()),
        }
    }
}

/// Speech synthesis or playback failed
#[derive(Debug, Error)]
#[error("synthesis failed: {0}")]
pub struct SynthesisError(pub String);

impl From<Error> for SynthesisError {
    fn from(err: Error) -> Self {
        Self(err.to_string())
    }
}

/// Category of a problem-data provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Provider endpoint or process could not be reached
    Connectivity,
    /// Provider answered with something that is not a valid response
    Protocol,
    /// Session credential was rejected
    Auth,
    /// Provider has no data for the query
    NotFound,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connectivity => "connectivity",
            Self::Protocol => "protocol",
            Self::Auth => "auth",
            Self::NotFound => "not found",
        })
    }
}

/// Problem-data provider failure
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct ProviderError {
    /// Failure category
    pub kind: ProviderErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl ProviderError {
    /// Create a provider error of the given kind
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Provider could not be reached
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Connectivity, message)
    }

    /// Provider returned an invalid response
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Protocol, message)
    }

    /// Credential rejected
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    /// No data for the query
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::protocol(err.to_string())
        } else {
            Self::connectivity(err.to_string())
        }
    }
}

/// Category of a language-model backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// Missing or invalid backend credential
    Auth,
    /// Backend could not be reached or timed out
    Unreachable,
    /// Backend refused the request due to rate limits
    RateLimited,
    /// Any other backend failure
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auth => "auth",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate limited",
            Self::Other => "other",
        })
    }
}

/// Language-model backend failure
#[derive(Debug, Clone, Error)]
#[error("backend {kind} error: {message}")]
pub struct BackendError {
    /// Failure category
    pub kind: BackendErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl BackendError {
    /// Create a backend error of the given kind
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Map an HTTP status from the backend to an error kind
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => BackendErrorKind::Auth,
            429 => BackendErrorKind::RateLimited,
            502..=504 => BackendErrorKind::Unreachable,
            _ => BackendErrorKind::Other,
        };
        Self::new(kind, format!("{status}: {body}"))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_connect() || err.is_timeout() || err.is_request() {
            BackendErrorKind::Unreachable
        } else {
            BackendErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}
