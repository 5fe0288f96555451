//! Decide whether a question should be enriched with LeetCode data

use std::sync::LazyLock;

use regex::Regex;

use crate::leetcode::{Difficulty, ProblemQuery};
use crate::session::normalize_utterance;

/// Topics specific enough to search for, longest phrases first
const SEARCH_TOPICS: &[&str] = &[
    "dynamic programming",
    "binary search tree",
    "binary search",
    "binary tree",
    "linked list",
    "hash table",
    "hash map",
    "two pointers",
    "sliding window",
    "bit manipulation",
    "topological sort",
    "union find",
    "depth first search",
    "breadth first search",
    "backtracking",
    "recursion",
    "greedy",
    "graph",
    "heap",
    "stack",
    "queue",
    "trie",
    "matrix",
    "sorting",
    "array",
    "string",
];

/// Phrases that mark a coding question without naming a topic
const CODING_MARKERS: &[&str] = &[
    "leetcode",
    "leet code",
    "algorithm",
    "data structure",
    "time complexity",
    "space complexity",
    "big o",
    "interview",
    "coding",
    "problem",
];

const DAILY_PHRASES: &[&str] = &[
    "daily challenge",
    "daily problem",
    "daily question",
    "problem of the day",
    "question of the day",
    "todays problem",
    "todays challenge",
];

const PROFILE_PHRASES: &[&str] = &[
    "my profile",
    "my stats",
    "my ranking",
    "my rank",
    "how many problems have i solved",
    "how many have i solved",
];

const SUBMISSION_PHRASES: &[&str] = &[
    "my submissions",
    "my recent submissions",
    "my last submission",
    "what did i submit",
    "what have i solved recently",
];

static PROBLEM_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:problem|question|leetcode|number)\s*(?:number\s*)?#?\s*(\d{1,4})\b|#(\d{1,4})\b")
        .expect("valid regex")
});

static SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-z0-9]+(?:-[a-z0-9]+)+\b").expect("valid regex")
});

/// Whole-phrase match on normalized text
fn mentions(normalized: &str, phrase: &str) -> bool {
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}

fn mentions_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| mentions(normalized, p))
}

fn difficulty(normalized: &str) -> Option<Difficulty> {
    if mentions(normalized, "easy") {
        Some(Difficulty::Easy)
    } else if mentions(normalized, "medium") {
        Some(Difficulty::Medium)
    } else if mentions(normalized, "hard") {
        Some(Difficulty::Hard)
    } else {
        None
    }
}

/// Derive a lookup from a question, if it is about LeetCode material
///
/// Profile and submission questions need `username`.
#[must_use]
pub fn detect(question: &str, username: Option<&str>) -> Option<ProblemQuery> {
    let normalized = normalize_utterance(question);
    if normalized.is_empty() {
        return None;
    }

    if mentions_any(&normalized, DAILY_PHRASES) {
        return Some(ProblemQuery::DailyChallenge);
    }

    if let Some(username) = username {
        if mentions_any(&normalized, SUBMISSION_PHRASES) {
            return Some(ProblemQuery::RecentSubmissions {
                username: username.to_string(),
                limit: 5,
            });
        }
        if mentions_any(&normalized, PROFILE_PHRASES) {
            return Some(ProblemQuery::UserProfile {
                username: username.to_string(),
            });
        }
    }

    let coding = mentions_any(&normalized, CODING_MARKERS);

    if coding && let Some(slug) = SLUG.find(&question.to_ascii_lowercase()) {
        return Some(ProblemQuery::Problem {
            slug: slug.as_str().to_string(),
        });
    }

    if let Some(caps) = PROBLEM_NUMBER.captures(question)
        && let Some(number) = caps.get(1).or_else(|| caps.get(2))
    {
        return Some(ProblemQuery::Search {
            keywords: number.as_str().to_string(),
            difficulty: None,
            limit: 1,
        });
    }

    SEARCH_TOPICS
        .iter()
        .find(|topic| mentions(&normalized, topic))
        .map(|topic| ProblemQuery::Search {
            keywords: (*topic).to_string(),
            difficulty: difficulty(&normalized),
            limit: 3,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(keywords: &str, limit: u32) -> ProblemQuery {
        ProblemQuery::Search {
            keywords: keywords.to_string(),
            difficulty: None,
            limit,
        }
    }

    #[test]
    fn test_topic_keyword() {
        assert_eq!(
            detect("What is the time complexity of binary search?", None),
            Some(search("binary search", 3))
        );
        assert_eq!(
            detect("Explain dynamic programming", None),
            Some(search("dynamic programming", 3))
        );
    }

    #[test]
    fn test_difficulty_filter() {
        assert_eq!(
            detect("give me an easy linked list problem", None),
            Some(ProblemQuery::Search {
                keywords: "linked list".to_string(),
                difficulty: Some(Difficulty::Easy),
                limit: 3,
            })
        );
    }

    #[test]
    fn test_problem_number() {
        assert_eq!(detect("Tell me about problem 1", None), Some(search("1", 1)));
        assert_eq!(detect("what is leetcode #42", None), Some(search("42", 1)));
        assert_eq!(
            detect("what's problem number 217 about", None),
            Some(search("217", 1))
        );
    }

    #[test]
    fn test_slug_needs_coding_context() {
        assert_eq!(
            detect("explain the two-sum problem", None),
            Some(ProblemQuery::Problem {
                slug: "two-sum".to_string()
            })
        );
        assert_eq!(detect("is real-time audio hard", None), None);
    }

    #[test]
    fn test_daily_challenge() {
        assert_eq!(
            detect("What's today's daily challenge?", None),
            Some(ProblemQuery::DailyChallenge)
        );
    }

    #[test]
    fn test_account_questions_need_username() {
        assert_eq!(detect("show my recent submissions", None), None);
        assert_eq!(
            detect("show my recent submissions", Some("alice")),
            Some(ProblemQuery::RecentSubmissions {
                username: "alice".to_string(),
                limit: 5
            })
        );
        assert_eq!(
            detect("How many problems have I solved?", Some("alice")),
            Some(ProblemQuery::UserProfile {
                username: "alice".to_string()
            })
        );
    }

    #[test]
    fn test_unrelated_question() {
        assert_eq!(detect("What's the weather like?", None), None);
        assert_eq!(detect("Hello there", None), None);
        assert_eq!(detect("", None), None);
    }
}
