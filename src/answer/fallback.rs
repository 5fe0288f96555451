//! Deterministic answers used when the backend cannot answer

use super::AnswerText;
use crate::leetcode::ProblemData;
use crate::session::normalize_utterance;

/// Answer when neither the backend nor looked-up data can help
pub const GENERIC_APOLOGY: &str =
    "I'm sorry, my AI backend isn't available right now, so I can't answer that properly. Please check your OpenAI API configuration.";

/// Answer to an empty question
pub const NOTHING_HEARD: &str = "I didn't hear anything. Could you please repeat your question?";

/// Lead-in for answers built from looked-up data
pub const FOUND_PREFIX: &str =
    "I don't have access to an AI backend right now, but here's what I found:";

/// Phrase and reply pairs, checked in order on whole words
const CANNED: &[(&str, &str)] = &[
    (
        "hello",
        "Hello! I'm your voice assistant. I can help with LeetCode problems and general questions!",
    ),
    (
        "hi",
        "Hi there! Ask me about LeetCode problems or any other questions!",
    ),
    (
        "hey",
        "Hi there! Ask me about LeetCode problems or any other questions!",
    ),
    (
        "how are you",
        "I'm doing great! Ready to help with LeetCode or other questions. How can I assist you?",
    ),
    (
        "what is your name",
        "I'm your voice assistant powered by AI with LeetCode integration.",
    ),
    (
        "whats your name",
        "I'm your voice assistant powered by AI with LeetCode integration.",
    ),
    (
        "who are you",
        "I'm your voice assistant powered by AI with LeetCode integration.",
    ),
    (
        "what can you do",
        "I can look up LeetCode problems, the daily challenge and your recent submissions, and answer general questions.",
    ),
    ("goodbye", "Goodbye! It was nice talking with you."),
    ("bye", "Bye! Have a great day!"),
    (
        "thank you",
        "You're welcome! Is there anything else I can help you with?",
    ),
    ("thanks", "You're welcome!"),
];

const MATH_WORDS: &[&str] = &["calculate", "math", "plus", "minus", "times", "divided"];

const MATH_REPLY: &str =
    "I can help with basic math, but I need my AI backend for calculations and it isn't available right now.";

fn has_phrase(normalized: &str, phrase: &str) -> bool {
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}

/// Canned reply for greetings and capability questions
#[must_use]
pub fn canned_response(question: &str) -> Option<&'static str> {
    let normalized = normalize_utterance(question);
    if normalized.is_empty() {
        return None;
    }

    CANNED
        .iter()
        .find(|(phrase, _)| has_phrase(&normalized, phrase))
        .map(|(_, reply)| *reply)
        .or_else(|| {
            MATH_WORDS
                .iter()
                .any(|w| has_phrase(&normalized, w))
                .then_some(MATH_REPLY)
        })
}

/// Local answer, never empty
///
/// Looked-up data wins, then canned replies, then the generic apology.
#[must_use]
pub fn local_answer(question: &str, found: Option<&ProblemData>) -> AnswerText {
    if question.trim().is_empty() {
        return AnswerText::known(NOTHING_HEARD);
    }

    if let Some(text) =
        found.and_then(|data| AnswerText::new(format!("{FOUND_PREFIX} {}", data.summary())))
    {
        return text;
    }

    canned_response(question).map_or_else(
        || AnswerText::known(GENERIC_APOLOGY),
        AnswerText::known,
    )
}
