//! Answer generation
//!
//! [`AnswerGenerator::generate`] never fails. When the backend cannot answer
//! the result is [`Answer::Degraded`] with text from the local fallback.

pub mod fallback;
pub mod speech;
pub mod topic;

use std::fmt;

use crate::error::BackendErrorKind;
use crate::leetcode::{PlatformCredential, ProblemData, ProviderChain, ProviderLookup};
use crate::llm::{LanguageModel, Prompt};

/// Longest answer passed to speech synthesis
pub const MAX_SPOKEN_CHARS: usize = 600;

/// Sentence appended when account data could not be used
pub const ANONYMOUS_CAVEAT: &str =
    "Note that I couldn't access your LeetCode account, so this is based on public data only.";

/// Non-empty answer text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerText(String);

impl AnswerText {
    /// Wrap text, `None` if it is blank
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Wrap a non-empty constant
    pub(crate) fn known(text: &'static str) -> Self {
        debug_assert!(!text.trim().is_empty());
        Self(text.to_string())
    }

    /// The text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a sentence
    #[must_use]
    pub fn with_sentence(self, sentence: &str) -> Self {
        Self(format!("{} {sentence}", self.0))
    }
}

impl fmt::Display for AnswerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AnswerText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Why an answer is degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// No backend is configured
    BackendNotConfigured,
    /// The backend failed
    Backend(BackendErrorKind),
    /// The backend answered but account data was unavailable
    AnonymousOnly,
    /// The question was empty
    NothingHeard,
}

/// Result of answering one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Produced by the backend
    Generated(AnswerText),
    /// Produced with reduced capability
    Degraded {
        /// Text to speak
        text: AnswerText,
        /// What was missing
        reason: DegradedReason,
    },
}

impl Answer {
    /// Text to speak
    #[must_use]
    pub const fn text(&self) -> &AnswerText {
        match self {
            Self::Generated(text) | Self::Degraded { text, .. } => text,
        }
    }

    /// Whether the backend could not produce this answer
    #[must_use]
    pub const fn backend_failed(&self) -> bool {
        matches!(
            self,
            Self::Degraded {
                reason: DegradedReason::BackendNotConfigured | DegradedReason::Backend(_),
                ..
            }
        )
    }
}

/// Answers questions with the backend, enriched by provider lookups
pub struct AnswerGenerator {
    backend: Option<Box<dyn LanguageModel>>,
    providers: ProviderChain,
    credential: Option<PlatformCredential>,
    username: Option<String>,
}

impl AnswerGenerator {
    /// Create a generator; `None` for the backend means fallback only
    #[must_use]
    pub fn new(backend: Option<Box<dyn LanguageModel>>, providers: ProviderChain) -> Self {
        Self {
            backend,
            providers,
            credential: None,
            username: None,
        }
    }

    /// Use a LeetCode session for lookups
    #[must_use]
    pub fn with_credential(mut self, credential: Option<PlatformCredential>) -> Self {
        self.credential = credential;
        self
    }

    /// Username for profile and submission questions
    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Whether a backend is configured
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// The provider chain used for lookups
    #[must_use]
    pub const fn providers(&self) -> &ProviderChain {
        &self.providers
    }

    /// Answer a question
    pub async fn generate(&self, question: &str) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::Degraded {
                text: AnswerText::known(fallback::NOTHING_HEARD),
                reason: DegradedReason::NothingHeard,
            };
        }

        let lookup = match topic::detect(question, self.username.as_deref()) {
            Some(query) => {
                tracing::debug!(%query, "looking up problem data");
                Some(
                    self.providers
                        .lookup(&query, self.credential.as_ref())
                        .await,
                )
            }
            None => None,
        };

        let found = lookup.as_ref().and_then(ProviderLookup::found);
        let anonymous_only = matches!(
            lookup,
            Some(ProviderLookup::Unavailable {
                anonymous_only: true,
                ..
            })
        );

        let local = || {
            let text = fallback::local_answer(question, found.map(|(data, _)| data));
            if anonymous_only {
                text.with_sentence(ANONYMOUS_CAVEAT)
            } else {
                text
            }
        };

        let Some(backend) = &self.backend else {
            return Answer::Degraded {
                text: local(),
                reason: DegradedReason::BackendNotConfigured,
            };
        };

        let prompt = compose_prompt(question, found, anonymous_only);

        let failure = match backend.complete(&prompt).await {
            Ok(raw) => {
                match AnswerText::new(speech::normalize_for_speech(&raw, MAX_SPOKEN_CHARS)) {
                    Some(text) if anonymous_only => {
                        return Answer::Degraded {
                            text: text.with_sentence(ANONYMOUS_CAVEAT),
                            reason: DegradedReason::AnonymousOnly,
                        };
                    }
                    Some(text) => return Answer::Generated(text),
                    None => {
                        tracing::warn!(
                            backend = backend.name(),
                            "backend answer was empty after cleanup"
                        );
                        BackendErrorKind::Other
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    kind = %e.kind,
                    error = %e.message,
                    "backend failed, using local answer"
                );
                e.kind
            }
        };

        Answer::Degraded {
            text: local(),
            reason: DegradedReason::Backend(failure),
        }
    }
}

/// Build the user message, embedding looked-up data when present
fn compose_prompt(
    question: &str,
    found: Option<(&ProblemData, &'static str)>,
    anonymous_only: bool,
) -> Prompt {
    let mut user = question.to_string();

    if let Some((data, provider)) = found {
        user.push_str(&format!(
            "\n\n<leetcode-data source=\"{provider}\">\n{}\n</leetcode-data>",
            data.summary()
        ));
    }
    if anonymous_only {
        user.push_str(
            "\n\nThe user's LeetCode account could not be accessed; only public data is available.",
        );
    }

    Prompt::new(user)
}
