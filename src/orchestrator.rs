//! Conversation turn loop
//!
//! Each turn runs capture, transcription, intent classification, answer
//! generation and synthesis in order. Per-turn failures are logged or
//! spoken and the loop continues; only a termination phrase, an interrupt or
//! the turn limit ends the session.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::answer::{Answer, AnswerGenerator};
use crate::error::TranscriptionError;
use crate::session::{EndReason, FAREWELL, Intent, Session, SessionSummary, Turn, classify};
pub use crate::voice::HEARING_WARNING;
use crate::voice::{SynthesisPort, TranscriptionPort};


/// Spoken once at session start by the interactive front-ends
pub const WELCOME: &str =
    "Hello! I'm your voice assistant. Ask me anything about LeetCode or general topics. Say 'quit' or 'exit' to stop.";

/// Turn loop settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How long each capture listens
    pub capture_duration: Duration,
    /// Consecutive transcription failures before the hearing warning
    pub transcription_failure_threshold: u32,
    /// Consecutive fallback answers before a logged warning
    pub answer_failure_threshold: u32,
    /// End the session after this many turns
    pub max_turns: Option<u64>,
    /// Spoken before the first turn
    pub greeting: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            capture_duration: Duration::from_secs(5),
            transcription_failure_threshold: 3,
            answer_failure_threshold: 3,
            max_turns: None,
            greeting: None,
        }
    }
}

/// Drives turns until the session ends
pub struct Orchestrator<T, S> {
    transcriber: T,
    speaker: S,
    answers: AnswerGenerator,
    config: OrchestratorConfig,
}

impl<T, S> Orchestrator<T, S>
where
    T: TranscriptionPort,
    S: SynthesisPort,
{
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        transcriber: T,
        speaker: S,
        answers: AnswerGenerator,
        config: OrchestratorConfig,
    ) -> Self {
        let config = OrchestratorConfig {
            transcription_failure_threshold: config.transcription_failure_threshold.max(1),
            answer_failure_threshold: config.answer_failure_threshold.max(1),
            ..config
        };
        Self {
            transcriber,
            speaker,
            answers,
            config,
        }
    }

    /// Answer generator in use
    #[must_use]
    pub const fn answers(&self) -> &AnswerGenerator {
        &self.answers
    }

    /// Run a session to completion
    ///
    /// Any message on `shutdown` interrupts the session: before the next turn,
    /// or while waiting for capture. A closed channel never interrupts.
    pub async fn run(&self, shutdown: &mut mpsc::Receiver<()>) -> SessionSummary {
        let mut session = Session::start();
        let span = tracing::info_span!("session", id = %session.id());

        self.drive(&mut session, shutdown).instrument(span).await;

        let summary = session.finish();
        tracing::info!(
            id = %summary.id,
            turns = summary.turns,
            reason = ?summary.end_reason,
            seconds = summary.duration.as_secs(),
            "session finished"
        );
        summary
    }

    async fn drive(&self, session: &mut Session, shutdown: &mut mpsc::Receiver<()>) {
        if let Some(greeting) = &self.config.greeting {
            self.say(greeting).await;
        }

        while session.is_active() {
            if shutdown.try_recv().is_ok() {
                tracing::info!("interrupted");
                session.end(EndReason::Interrupted);
                break;
            }
            if self.config.max_turns.is_some_and(|max| session.turns() >= max) {
                tracing::info!(turns = session.turns(), "turn limit reached");
                session.end(EndReason::TurnLimit);
                break;
            }

            let turn = self.run_turn(session, shutdown).await;
            tracing::debug!(
                turn = turn.number,
                intent = ?turn.intent,
                spoke = turn.spoke(),
                "turn finished"
            );
        }
    }

    /// Run one turn
    ///
    /// A turn interrupted while capturing ends the session and is not
    /// counted.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        shutdown: &mut mpsc::Receiver<()>,
    ) -> Turn {
        let mut turn = Turn::new(session.next_turn_number());

        let captured = tokio::select! {
            Some(()) = shutdown.recv() => {
                tracing::info!(turn = turn.number, "interrupted while listening");
                session.end(EndReason::Interrupted);
                return turn;
            }
            captured = self.transcriber.capture(self.config.capture_duration) => captured,
        };

        let transcript = match captured {
            Ok(sample) => self.transcriber.transcribe(sample).await,
            Err(e) => Err(e),
        };

        let text = match transcript {
            Ok(text) => text,
            Err(e) => {
                turn.warned = self.transcription_failed(session, &e).await;
                session.complete_turn();
                return turn;
            }
        };

        turn.intent = classify(&text);
        turn.transcript = Some(text);

        match turn.intent {
            Intent::Empty => {
                turn.warned = self
                    .transcription_failed(session, &TranscriptionError::Empty)
                    .await;
            }
            Intent::Terminate => {
                session.record_transcription_success();
                tracing::info!(turn = turn.number, "{FAREWELL}");
                session.end(EndReason::Farewell);
            }
            Intent::Query => {
                session.record_transcription_success();
                let question = turn.transcript.as_deref().unwrap_or_default();
                tracing::info!(turn = turn.number, question, "heard");

                let answer = self.answers.generate(question).await;
                self.track_answer(session, &answer);
                tracing::info!(
                    turn = turn.number,
                    answer = %answer.text(),
                    degraded = !matches!(answer, Answer::Generated(_)),
                    "answering"
                );

                let spoken = self.speaker.speak(answer.text().as_str()).await;
                if let Err(e) = &spoken {
                    tracing::warn!(turn = turn.number, error = %e, "could not speak answer");
                }
                turn.answer = Some(answer);
                turn.synthesis = Some(spoken);
            }
        }

        session.complete_turn();
        turn
    }

    /// Record a failed transcription; returns whether the warning was raised
    async fn transcription_failed(
        &self,
        session: &mut Session,
        error: &TranscriptionError,
    ) -> bool {
        let failures = session.record_transcription_failure();
        let threshold = self.config.transcription_failure_threshold;

        tracing::info!(failures, error = %error, "didn't catch that");

        if !failures.is_multiple_of(threshold) {
            return false;
        }

        let warning = self.transcriber.hearing_warning();
        tracing::warn!(failures, "{warning}");
        self.say(warning).await;
        true
    }

    fn track_answer(&self, session: &mut Session, answer: &Answer) {
        if !answer.backend_failed() {
            session.record_answer_success();
            return;
        }

        let failures = session.record_answer_failure();
        if failures == self.config.answer_failure_threshold {
            tracing::warn!(
                failures,
                "AI backend unavailable for several answers in a row, answering from local fallback"
            );
        }
    }

    async fn say(&self, text: &str) {
        if let Err(e) = self.speaker.speak(text).await {
            tracing::warn!(error = %e, "could not speak");
        }
    }
}
