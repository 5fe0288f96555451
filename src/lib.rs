//! voice-qa - Spoken question answering with LeetCode lookups
//!
//! This library provides the pieces of a turn-based voice assistant:
//! - Voice input and output (microphone capture, Whisper STT, TTS)
//! - Intent classification and explicit session state
//! - Answer generation with a local fallback when the AI backend fails
//! - LeetCode lookups through an MCP server with a GraphQL fallback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Orchestrator                      │
//! │  capture → transcribe → classify → answer → speak   │
//! └──────┬──────────────────┬───────────────────┬───────┘
//!        │                  │                   │
//! ┌──────▼──────┐   ┌───────▼────────┐   ┌──────▼──────┐
//! │    Voice    │   │    Answers     │   │   Session   │
//! │  STT / TTS  │   │  LLM  │ local  │   │   counters  │
//! └─────────────┘   └───────┬────────┘   └─────────────┘
//!                           │
//!                   ┌───────▼────────┐
//!                   │ ProviderChain  │
//!                   │ MCP → GraphQL  │
//!                   └────────────────┘
//! ```

pub mod answer;
pub mod config;
pub mod error;
pub mod leetcode;
pub mod llm;
pub mod orchestrator;
pub mod session;
pub mod voice;

pub use answer::{Answer, AnswerGenerator, AnswerText, DegradedReason};
pub use config::Config;
pub use error::{Error, Result};
pub use leetcode::{ProblemProvider, ProblemQuery, ProviderChain, ProviderLookup};
pub use llm::LanguageModel;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use session::{EndReason, Intent, Session, SessionSummary, Turn};
pub use voice::{SynthesisPort, TranscriptionPort};
