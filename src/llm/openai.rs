//! OpenAI-compatible chat completions backend

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{LanguageModel, Prompt};
use crate::error::{BackendError, BackendErrorKind};
use crate::{Error, Result};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions against an OpenAI-compatible API
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiBackend {
    /// Create a backend
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: &SecretString,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config("OpenAI API key is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: SecretString::from(api_key.expose_secret().to_string()),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            max_tokens: 150,
            temperature: 0.7,
        })
    }

    /// Override sampling parameters
    #[must_use]
    pub const fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAiBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> std::result::Result<String, BackendError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, "requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::new(BackendErrorKind::Other, e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BackendError::new(BackendErrorKind::Other, "empty completion"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let prompt = Prompt::new("What is a heap?");
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: 150,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["content"], "What is a heap?");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 150);
    }

    #[test]
    fn test_empty_key_rejected() {
        let key = SecretString::from("  ".to_string());
        assert!(
            OpenAiBackend::new(&key, "https://api.openai.com/v1", "m", Duration::from_secs(1))
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let key = SecretString::from("sk-test".to_string());
        let backend =
            OpenAiBackend::new(&key, "http://127.0.0.1:9/v1", "m", Duration::from_secs(2))
                .unwrap();
        let err = backend.complete(&Prompt::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Unreachable);
    }
}
