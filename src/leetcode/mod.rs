//! LeetCode problem-data providers
//!
//! Two providers implement [`ProblemProvider`]: [`McpProvider`] talks to a
//! LeetCode MCP server over stdio, [`GraphqlProvider`] calls the public
//! GraphQL endpoint. [`ProviderChain`] tries them in order.

mod chain;
mod graphql;
mod mcp;
mod model;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

pub use chain::{ProviderChain, ProviderLookup};
pub use graphql::GraphqlProvider;
pub use mcp::McpProvider;
pub use model::{
    DailyChallenge, Problem, ProblemData, ProblemSummary, SolvedCount, Submission, TopicTag,
    UserProfile, decode,
};

use crate::error::ProviderError;

/// LeetCode deployment to query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Site {
    /// leetcode.com
    #[default]
    Global,
    /// leetcode.cn
    Cn,
}

impl Site {
    /// Site root URL
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Global => "https://leetcode.com",
            Self::Cn => "https://leetcode.cn",
        }
    }

    /// GraphQL endpoint URL
    #[must_use]
    pub fn graphql_url(self) -> String {
        format!("{}/graphql", self.base_url())
    }

    /// Name used by the MCP server's `LEETCODE_SITE` variable
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Cn => "cn",
        }
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "com" | "leetcode.com" => Ok(Self::Global),
            "cn" | "china" | "leetcode.cn" => Ok(Self::Cn),
            other => Err(format!("unknown LeetCode site: {other} (expected global or cn)")),
        }
    }
}

/// Problem difficulty filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Easy
    Easy,
    /// Medium
    Medium,
    /// Hard
    Hard,
}

impl Difficulty {
    /// Value the LeetCode API expects
    #[must_use]
    pub const fn as_api_str(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

/// What to look up
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProblemQuery {
    /// A problem by slug
    Problem {
        /// Title slug, e.g. "two-sum"
        slug: String,
    },
    /// Today's daily challenge
    DailyChallenge,
    /// Keyword search
    Search {
        /// Search keywords or a problem number
        keywords: String,
        /// Optional difficulty filter
        difficulty: Option<Difficulty>,
        /// Maximum results
        limit: u32,
    },
    /// A user's public profile
    UserProfile {
        /// LeetCode username
        username: String,
    },
    /// A user's recent submissions
    RecentSubmissions {
        /// LeetCode username
        username: String,
        /// Maximum results
        limit: u32,
    },
}

impl ProblemQuery {
    /// Parse a command-line lookup target
    ///
    /// Accepts `daily`, `user:<name>`, `submissions:<name>`, a slug such as
    /// `two-sum`, or free-text search keywords.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case("daily") {
            return Self::DailyChallenge;
        }
        if let Some(username) = input.strip_prefix("user:") {
            return Self::UserProfile {
                username: username.trim().to_string(),
            };
        }
        if let Some(username) = input.strip_prefix("submissions:") {
            return Self::RecentSubmissions {
                username: username.trim().to_string(),
                limit: 5,
            };
        }
        let is_slug = input.contains('-')
            && input
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if is_slug {
            return Self::Problem {
                slug: input.to_string(),
            };
        }
        Self::Search {
            keywords: input.to_string(),
            difficulty: None,
            limit: 5,
        }
    }
}

impl fmt::Display for ProblemQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Problem { slug } => write!(f, "problem {slug}"),
            Self::DailyChallenge => f.write_str("daily challenge"),
            Self::Search { keywords, .. } => write!(f, "search \"{keywords}\""),
            Self::UserProfile { username } => write!(f, "profile {username}"),
            Self::RecentSubmissions { username, .. } => write!(f, "submissions {username}"),
        }
    }
}

/// LeetCode session cookie
///
/// Cheap to clone; the secret is shared, never printed.
#[derive(Clone)]
pub struct PlatformCredential(Arc<SecretString>);

impl PlatformCredential {
    /// Wrap a session cookie value, `None` if it is blank
    #[must_use]
    pub fn new(session: impl Into<String>) -> Option<Self> {
        let session = session.into();
        if session.trim().is_empty() {
            return None;
        }
        Some(Self(Arc::new(SecretString::from(session.trim().to_string()))))
    }

    /// The raw cookie value
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for PlatformCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlatformCredential([REDACTED])")
    }
}

/// Source of problem data
#[async_trait]
pub trait ProblemProvider: Send + Sync {
    /// Provider name for logs and status
    fn name(&self) -> &'static str;

    /// Look up data for a query
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing why no data was produced
    async fn fetch(
        &self,
        query: &ProblemQuery,
        credential: Option<&PlatformCredential>,
    ) -> Result<ProblemData, ProviderError>;
}
