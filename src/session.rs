//! Session and turn bookkeeping
//!
//! A [`Session`] is created when the conversation starts and consumed into a
//! [`SessionSummary`] when it ends. Only the orchestrator mutates it.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::answer::Answer;
use crate::error::SynthesisError;

/// Utterances that end the session, compared after [`normalize_utterance`]
pub const TERMINATION_PHRASES: &[&str] = &[
    "quit",
    "exit",
    "stop",
    "bye",
    "goodbye",
    "good bye",
    "bye bye",
    "quit now",
    "exit now",
    "stop now",
    "stop listening",
    "thats all",
];

/// Fixed farewell shown when the user ends the session
pub const FAREWELL: &str = "Goodbye! Thanks for using the voice assistant.";

/// What the user meant by a turn's transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// End the session
    Terminate,
    /// Ask something
    Query,
    /// Nothing usable was heard
    Empty,
}

/// Lowercase, drop punctuation and collapse whitespace
///
/// Apostrophes are dropped so "That's all." becomes "thats all".
#[must_use]
pub fn normalize_utterance(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a transcript
#[must_use]
pub fn classify(transcript: &str) -> Intent {
    let normalized = normalize_utterance(transcript);

    if normalized.is_empty() {
        Intent::Empty
    } else if TERMINATION_PHRASES.contains(&normalized.as_str()) {
        Intent::Terminate
    } else {
        Intent::Query
    }
}

/// One pass of capture, transcribe, answer, speak
#[derive(Debug)]
pub struct Turn {
    /// Turn number within the session, starting at 1
    pub number: u64,
    /// Transcript, `None` when capture or transcription failed
    pub transcript: Option<String>,
    /// Classified intent
    pub intent: Intent,
    /// Answer, when one was generated
    pub answer: Option<Answer>,
    /// Result of speaking the answer, when speaking was attempted
    pub synthesis: Option<Result<(), SynthesisError>>,
    /// The repeated-failure warning was raised this turn
    pub warned: bool,
}

impl Turn {
    /// Start a turn with nothing known yet
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self {
            number,
            transcript: None,
            intent: Intent::Empty,
            answer: None,
            synthesis: None,
            warned: false,
        }
    }

    /// Whether the answer was spoken successfully
    #[must_use]
    pub const fn spoke(&self) -> bool {
        matches!(self.synthesis, Some(Ok(())))
    }
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The user said a termination phrase
    Farewell,
    /// An external interrupt arrived
    Interrupted,
    /// The caller-supplied turn limit was reached
    TurnLimit,
}

/// In-memory state of one conversation run
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    turns: u64,
    transcription_failures: u32,
    answer_failures: u32,
    active: bool,
    end_reason: Option<EndReason>,
}

impl Session {
    /// Start a new active session
    #[must_use]
    pub fn start() -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            turns: 0,
            transcription_failures: 0,
            answer_failures: 0,
            active: true,
            end_reason: None,
        };
        tracing::debug!(id = %session.id, "session started");
        session
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Whether further turns may run
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Completed turns so far
    #[must_use]
    pub const fn turns(&self) -> u64 {
        self.turns
    }

    /// Consecutive failed transcriptions
    #[must_use]
    pub const fn transcription_failures(&self) -> u32 {
        self.transcription_failures
    }

    /// Consecutive answers that fell back to the local strategy
    #[must_use]
    pub const fn answer_failures(&self) -> u32 {
        self.answer_failures
    }

    /// Why the session ended, once it has
    #[must_use]
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Number the next turn will get
    #[must_use]
    pub const fn next_turn_number(&self) -> u64 {
        self.turns + 1
    }

    /// Count a finished turn
    pub const fn complete_turn(&mut self) {
        self.turns += 1;
    }

    /// Record a failed transcription, returning the new streak length
    pub const fn record_transcription_failure(&mut self) -> u32 {
        self.transcription_failures += 1;
        self.transcription_failures
    }

    /// Reset the transcription failure streak
    pub const fn record_transcription_success(&mut self) {
        self.transcription_failures = 0;
    }

    /// Record a degraded answer, returning the new streak length
    pub const fn record_answer_failure(&mut self) -> u32 {
        self.answer_failures += 1;
        self.answer_failures
    }

    /// Reset the answer failure streak
    pub const fn record_answer_success(&mut self) {
        self.answer_failures = 0;
    }

    /// Deactivate the session
    ///
    /// Returns `false` if it had already ended; the first reason is kept.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.end_reason = Some(reason);
        tracing::debug!(id = %self.id, ?reason, turns = self.turns, "session ended");
        true
    }

    /// Tear the session down into its summary
    #[must_use]
    pub fn finish(self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            started_at: self.started_at,
            duration: self.started.elapsed(),
            turns: self.turns,
            end_reason: self.end_reason,
        }
    }
}

/// What remains of a session after teardown
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session identifier
    pub id: Uuid,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// How long the session ran
    pub duration: Duration,
    /// Completed turns
    pub turns: u64,
    /// Why it ended, `None` if it was torn down while still active
    pub end_reason: Option<EndReason>,
}
