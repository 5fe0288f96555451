//! Language-model backends

mod openai;

use async_trait::async_trait;

pub use openai::OpenAiBackend;

use crate::error::BackendError;

/// System prompt for spoken answers
pub const SYSTEM_PROMPT: &str = "You are a helpful voice assistant with access to LeetCode data. \
Answer questions about coding problems, algorithms and general topics. \
When LeetCode data is provided, use it in your answer. \
Keep responses concise and conversational (1-3 sentences) since they will be spoken aloud. \
Do not use markdown, code blocks or lists.";

/// One completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System instructions
    pub system: String,
    /// User message, including any looked-up context
    pub user: String,
}

impl Prompt {
    /// Prompt with the default system instructions
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            user: user.into(),
        }
    }
}

/// Text completion backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Complete a prompt
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] classified by cause
    async fn complete(&self, prompt: &Prompt) -> Result<String, BackendError>;
}
