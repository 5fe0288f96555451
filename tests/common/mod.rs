//! Shared test utilities
//!
//! In-process stand-ins for the voice ports, problem providers and the
//! language model, so the turn loop runs without audio hardware or network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use voice_qa::error::{
    BackendError, BackendErrorKind, ProviderError, ProviderErrorKind, SynthesisError,
    TranscriptionError,
};
use voice_qa::leetcode::{
    DailyChallenge, PlatformCredential, ProblemData, ProblemProvider, ProblemQuery,
    ProblemSummary,
};
use voice_qa::llm::{LanguageModel, Prompt};
use voice_qa::voice::{SynthesisPort, TranscriptionPort};

/// Transcriber that replays scripted utterances
///
/// `None` entries transcribe as empty audio. Once the script runs out every
/// capture fails.
pub struct ScriptedTranscriber {
    script: Mutex<VecDeque<Option<String>>>,
    warning: Option<&'static str>,
}

impl ScriptedTranscriber {
    pub fn new<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(
                utterances
                    .into_iter()
                    .map(|u| u.map(Into::into))
                    .collect(),
            ),
            warning: None,
        }
    }

    /// Replace the port's default hearing warning
    pub fn with_warning(mut self, warning: &'static str) -> Self {
        self.warning = Some(warning);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl TranscriptionPort for ScriptedTranscriber {
    type Sample = Option<String>;

    async fn capture(&self, _duration: Duration) -> Result<Self::Sample, TranscriptionError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TranscriptionError::Capture("script exhausted".to_string()))
    }

    async fn transcribe(&self, sample: Self::Sample) -> Result<String, TranscriptionError> {
        sample.ok_or(TranscriptionError::Empty)
    }

    fn hearing_warning(&self) -> &str {
        self.warning.unwrap_or(voice_qa::voice::HEARING_WARNING)
    }
}

/// Transcriber whose capture never completes
pub struct StalledTranscriber;

#[async_trait]
impl TranscriptionPort for StalledTranscriber {
    type Sample = String;

    async fn capture(&self, _duration: Duration) -> Result<Self::Sample, TranscriptionError> {
        std::future::pending().await
    }

    async fn transcribe(&self, sample: Self::Sample) -> Result<String, TranscriptionError> {
        Ok(sample)
    }
}

/// Speaker that records what it was asked to say
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speaker that records then fails every call
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisPort for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(SynthesisError("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// Provider with a fixed outcome that records every call
#[derive(Clone)]
pub struct FakeProvider {
    name: &'static str,
    outcome: Result<ProblemData, ProviderErrorKind>,
    calls: Arc<Mutex<Vec<(ProblemQuery, bool)>>>,
    order: Option<CallOrder>,
}

/// Provider names in the order they were called, shared across fakes
pub type CallOrder = Arc<Mutex<Vec<&'static str>>>;

impl FakeProvider {
    pub fn failing(name: &'static str, kind: ProviderErrorKind) -> Self {
        Self {
            name,
            outcome: Err(kind),
            calls: Arc::default(),
            order: None,
        }
    }

    pub fn returning(name: &'static str, data: ProblemData) -> Self {
        Self {
            name,
            outcome: Ok(data),
            calls: Arc::default(),
            order: None,
        }
    }

    /// Also append this provider's name to a shared log on every call
    pub fn logging_to(mut self, order: &CallOrder) -> Self {
        self.order = Some(Arc::clone(order));
        self
    }

    /// Queries received, with whether a credential came along
    pub fn calls(&self) -> Vec<(ProblemQuery, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProblemProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(
        &self,
        query: &ProblemQuery,
        credential: Option<&PlatformCredential>,
    ) -> Result<ProblemData, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.clone(), credential.is_some()));
        if let Some(order) = &self.order {
            order.lock().unwrap().push(self.name);
        }
        self.outcome
            .clone()
            .map_err(|kind| ProviderError::new(kind, format!("{} refused", self.name)))
    }
}

/// Language model with a fixed outcome that records prompts
#[derive(Clone)]
pub struct FakeBackend {
    outcome: Result<String, BackendErrorKind>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

impl FakeBackend {
    pub fn answering(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing(kind: BackendErrorKind) -> Self {
        Self {
            outcome: Err(kind),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.outcome
            .clone()
            .map_err(|kind| BackendError::new(kind, "fake backend failure"))
    }
}

/// Daily challenge payload for Two Sum
pub fn two_sum_daily() -> ProblemData {
    ProblemData::Daily(DailyChallenge {
        date: "2026-10-19".to_string(),
        link: "/problems/two-sum/".to_string(),
        question: ProblemSummary {
            frontend_id: "1".to_string(),
            title: "Two Sum".to_string(),
            title_slug: "two-sum".to_string(),
            difficulty: "Easy".to_string(),
            ac_rate: Some(52.1),
            paid_only: false,
        },
    })
}
