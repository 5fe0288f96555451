//! Problem data returned by providers
//!
//! Both providers hand back loosely shaped JSON (the GraphQL `data` object or
//! the text payload of an MCP tool call). [`decode`] locates the relevant
//! object in either shape and turns it into typed data.

use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::Value;

use super::ProblemQuery;
use crate::answer::speech::{html_to_text, truncate_at_sentence};
use crate::error::ProviderError;

/// Longest problem statement excerpt included in a summary
const STATEMENT_EXCERPT_CHARS: usize = 320;

/// Topic tag attached to a problem
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicTag {
    /// Display name (e.g. "Hash Table")
    pub name: String,
    /// URL slug (e.g. "hash-table")
    #[serde(default)]
    pub slug: String,
}

/// Full problem details
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// Number shown on the website
    #[serde(alias = "questionFrontendId", alias = "frontendQuestionId", default)]
    pub frontend_id: String,
    /// Title
    pub title: String,
    /// URL slug
    pub title_slug: String,
    /// "Easy", "Medium" or "Hard"
    #[serde(default)]
    pub difficulty: String,
    /// Statement as HTML
    #[serde(default)]
    pub content: Option<String>,
    /// Topic tags
    #[serde(default)]
    pub topic_tags: Vec<TopicTag>,
}

/// Problem entry in a listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    /// Number shown on the website
    #[serde(alias = "questionFrontendId", alias = "frontendQuestionId", default)]
    pub frontend_id: String,
    /// Title
    pub title: String,
    /// URL slug
    pub title_slug: String,
    /// "Easy", "Medium" or "Hard"
    #[serde(default)]
    pub difficulty: String,
    /// Acceptance rate in percent
    #[serde(default)]
    pub ac_rate: Option<f64>,
    /// Premium-only problem
    #[serde(alias = "isPaidOnly", default)]
    pub paid_only: bool,
}

/// Today's daily challenge
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyChallenge {
    /// Challenge date (YYYY-MM-DD)
    pub date: String,
    /// Relative link on the website
    #[serde(default)]
    pub link: String,
    /// The challenge problem
    #[serde(alias = "problem")]
    pub question: ProblemSummary,
}

/// Accepted solution count for one difficulty
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SolvedCount {
    /// "All", "Easy", "Medium" or "Hard"
    pub difficulty: String,
    /// Problems solved
    pub count: u32,
}

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "MatchedUser")]
pub struct UserProfile {
    /// Username
    pub username: String,
    /// Global ranking
    pub ranking: Option<u64>,
    /// Solved counts by difficulty
    pub solved: Vec<SolvedCount>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    username: String,
    #[serde(default)]
    profile: Option<ProfileInfo>,
    #[serde(default)]
    submit_stats: Option<SubmitStats>,
}

#[derive(Deserialize)]
struct ProfileInfo {
    #[serde(default)]
    ranking: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitStats {
    #[serde(default)]
    ac_submission_num: Vec<SolvedCount>,
}

impl From<MatchedUser> for UserProfile {
    fn from(user: MatchedUser) -> Self {
        Self {
            username: user.username,
            ranking: user.profile.and_then(|p| p.ranking),
            solved: user
                .submit_stats
                .map(|s| s.ac_submission_num)
                .unwrap_or_default(),
        }
    }
}

/// One recent submission
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Problem title
    pub title: String,
    /// Problem slug
    #[serde(default)]
    pub title_slug: String,
    /// Verdict (e.g. "Accepted")
    #[serde(default)]
    pub status_display: String,
    /// Language used
    #[serde(default)]
    pub lang: String,
}

/// Structured result of a provider lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemData {
    /// A single problem
    Problem(Problem),
    /// The daily challenge
    Daily(DailyChallenge),
    /// Search results, never empty
    Search(Vec<ProblemSummary>),
    /// A user profile
    Profile(UserProfile),
    /// Recent submissions, never empty
    Submissions(Vec<Submission>),
}

impl ProblemData {
    /// Short plain-text rendering suitable for speech and prompts
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Problem(p) => {
                let mut out = format!("Problem {}, {}", p.frontend_id, p.title);
                if !p.difficulty.is_empty() {
                    let _ = write!(out, ", is rated {}", p.difficulty);
                }
                if !p.topic_tags.is_empty() {
                    let tags: Vec<&str> = p.topic_tags.iter().map(|t| t.name.as_str()).collect();
                    let _ = write!(out, " and covers {}", tags.join(", "));
                }
                out.push('.');
                if let Some(content) = p.content.as_deref() {
                    let statement = html_to_text(content);
                    if !statement.is_empty() {
                        out.push(' ');
                        out.push_str(&truncate_at_sentence(&statement, STATEMENT_EXCERPT_CHARS));
                    }
                }
                out
            }
            Self::Daily(d) => format!(
                "Today's daily challenge, for {}, is problem {}, {}, rated {}.",
                d.date, d.question.frontend_id, d.question.title, d.question.difficulty
            ),
            Self::Search(results) => {
                let listed: Vec<String> = results
                    .iter()
                    .map(|p| format!("{} {}, {}", p.frontend_id, p.title, p.difficulty))
                    .collect();
                let noun = if results.len() == 1 { "problem" } else { "problems" };
                format!("I found {} {noun}: {}.", results.len(), listed.join("; "))
            }
            Self::Profile(u) => {
                let mut out = u.username.clone();
                if let Some(rank) = u.ranking {
                    let _ = write!(out, " is ranked {rank} and");
                }
                let count = |difficulty: &str| {
                    u.solved
                        .iter()
                        .find(|s| s.difficulty.eq_ignore_ascii_case(difficulty))
                        .map_or(0, |s| s.count)
                };
                let _ = write!(
                    out,
                    " has solved {} problems: {} easy, {} medium and {} hard.",
                    count("All"),
                    count("Easy"),
                    count("Medium"),
                    count("Hard")
                );
                out
            }
            Self::Submissions(subs) => {
                let listed: Vec<String> = subs
                    .iter()
                    .map(|s| format!("{}, {} in {}", s.title, s.status_display, s.lang))
                    .collect();
                format!("Recent submissions: {}.", listed.join("; "))
            }
        }
    }
}

/// Decode a provider payload for the given query
///
/// # Errors
///
/// Returns not-found if the payload holds no matching data and protocol if
/// the data is present but malformed
pub fn decode(query: &ProblemQuery, payload: &Value) -> Result<ProblemData, ProviderError> {
    match query {
        ProblemQuery::Problem { slug } => {
            let obj = find_object(payload, &["title", "titleSlug"])
                .ok_or_else(|| ProviderError::not_found(format!("problem {slug}")))?;
            parse(obj).map(ProblemData::Problem)
        }
        ProblemQuery::DailyChallenge => {
            let obj = find_object(payload, &["date"])
                .ok_or_else(|| ProviderError::not_found("daily challenge"))?;
            parse(obj).map(ProblemData::Daily)
        }
        ProblemQuery::Search { keywords, .. } => {
            let list = find_array(payload, &["questions", "problems", "data"])
                .ok_or_else(|| ProviderError::not_found(format!("search \"{keywords}\"")))?;
            let results: Vec<ProblemSummary> = parse(list)?;
            if results.is_empty() {
                return Err(ProviderError::not_found(format!("search \"{keywords}\"")));
            }
            Ok(ProblemData::Search(results))
        }
        ProblemQuery::UserProfile { username } => {
            let obj = find_object(payload, &["username", "submitStats"])
                .or_else(|| find_object(payload, &["username"]))
                .ok_or_else(|| ProviderError::not_found(format!("user {username}")))?;
            parse(obj).map(ProblemData::Profile)
        }
        ProblemQuery::RecentSubmissions { username, .. } => {
            let list = find_array(payload, &["recentSubmissionList", "submissions"])
                .ok_or_else(|| ProviderError::not_found(format!("submissions for {username}")))?;
            let subs: Vec<Submission> = parse(list)?;
            if subs.is_empty() {
                return Err(ProviderError::not_found(format!("submissions for {username}")));
            }
            Ok(ProblemData::Submissions(subs))
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(value: &Value) -> Result<T, ProviderError> {
    T::deserialize(value).map_err(|e| ProviderError::protocol(format!("unexpected payload: {e}")))
}

/// Depth-first search for the first object that has every key (non-null)
fn find_object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if keys.iter().all(|k| map.get(*k).is_some_and(|v| !v.is_null())) {
                return Some(value);
            }
            map.values().find_map(|v| find_object(v, keys))
        }
        Value::Array(items) => items.iter().find_map(|v| find_object(v, keys)),
        _ => None,
    }
}

/// Depth-first search for an array stored under one of `keys`
///
/// A bare top-level array also matches.
fn find_array<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    match value {
        Value::Array(_) => Some(value),
        Value::Object(map) => keys
            .iter()
            .find_map(|k| map.get(*k).filter(|v| v.is_array()))
            .or_else(|| {
                map.values()
                    .filter(|v| v.is_object())
                    .find_map(|v| find_array(v, keys))
            }),
        _ => None,
    }
}
