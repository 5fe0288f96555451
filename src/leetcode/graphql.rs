//! Direct GraphQL provider

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{PlatformCredential, ProblemData, ProblemProvider, ProblemQuery, Site, decode};
use crate::error::ProviderError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

const QUESTION_QUERY: &str = r"
query questionData($titleSlug: String!) {
  question(titleSlug: $titleSlug) {
    questionId
    questionFrontendId
    title
    titleSlug
    content
    difficulty
    topicTags { name slug }
  }
}";

const DAILY_QUERY: &str = r"
query questionOfToday {
  activeDailyCodingChallengeQuestion {
    date
    link
    question {
      acRate
      difficulty
      frontendQuestionId: questionFrontendId
      paidOnly: isPaidOnly
      title
      titleSlug
    }
  }
}";

const SEARCH_QUERY: &str = r"
query problemsetQuestionList(
  $categorySlug: String
  $limit: Int
  $skip: Int
  $filters: QuestionListFilterInput
) {
  problemsetQuestionList: questionList(
    categorySlug: $categorySlug
    limit: $limit
    skip: $skip
    filters: $filters
  ) {
    total: totalNum
    questions: data {
      acRate
      difficulty
      frontendQuestionId: questionFrontendId
      paidOnly: isPaidOnly
      title
      titleSlug
    }
  }
}";

const PROFILE_QUERY: &str = r"
query userPublicProfile($username: String!) {
  matchedUser(username: $username) {
    username
    profile { ranking }
    submitStats { acSubmissionNum { difficulty count submissions } }
  }
}";

const SUBMISSIONS_QUERY: &str = r"
query recentSubmissions($username: String!, $limit: Int!) {
  recentSubmissionList(username: $username, limit: $limit) {
    title
    titleSlug
    timestamp
    statusDisplay
    lang
  }
}";

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Provider that queries the LeetCode GraphQL endpoint directly
pub struct GraphqlProvider {
    client: reqwest::Client,
    endpoint: String,
    site: Site,
}

impl GraphqlProvider {
    /// Create a provider for a site
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(site: Site, timeout: Duration) -> crate::Result<Self> {
        Self::with_endpoint(site, site.graphql_url(), timeout)
    }

    /// Create a provider against a custom endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn with_endpoint(
        site: Site,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            site,
        })
    }

    async fn post(
        &self,
        query: &str,
        variables: Value,
        credential: Option<&PlatformCredential>,
    ) -> Result<Value, ProviderError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, format!("{}/", self.site.base_url()))
            .json(&json!({ "query": query, "variables": variables }));

        if let Some(credential) = credential {
            request = request.header(
                COOKIE,
                format!("LEETCODE_SESSION={}; csrftoken=dummy", credential.expose()),
            );
        }

        let response = request.send().await?;
        let status = response.status();

        if credential.is_some() && matches!(status.as_u16(), 401 | 403) {
            return Err(ProviderError::auth(format!("LeetCode rejected the session ({status})")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::connectivity(format!(
                "LeetCode API error {status}: {body}"
            )));
        }

        let body: GraphqlResponse = response.json().await?;

        if !body.errors.is_empty() {
            let message = body
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if credential.is_some() && looks_like_auth_failure(&message) {
                return Err(ProviderError::auth(message));
            }
            if body.data.as_ref().is_none_or(Value::is_null) {
                return Err(ProviderError::protocol(message));
            }
            tracing::debug!(errors = %message, "GraphQL returned partial data");
        }

        body.data
            .ok_or_else(|| ProviderError::protocol("GraphQL response had no data"))
    }
}

fn looks_like_auth_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["authenticat", "login", "logged in", "permission", "unauthorized"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// GraphQL document and variables for a query
fn request_for(query: &ProblemQuery) -> (&'static str, Value) {
    match query {
        ProblemQuery::Problem { slug } => (QUESTION_QUERY, json!({ "titleSlug": slug })),
        ProblemQuery::DailyChallenge => (DAILY_QUERY, json!({})),
        ProblemQuery::Search {
            keywords,
            difficulty,
            limit,
        } => {
            let mut filters = serde_json::Map::new();
            if !keywords.is_empty() {
                filters.insert("searchKeywords".into(), json!(keywords));
            }
            if let Some(difficulty) = difficulty {
                filters.insert("difficulty".into(), json!(difficulty.as_api_str()));
            }
            (
                SEARCH_QUERY,
                json!({ "categorySlug": "", "limit": limit, "skip": 0, "filters": filters }),
            )
        }
        ProblemQuery::UserProfile { username } => (PROFILE_QUERY, json!({ "username": username })),
        ProblemQuery::RecentSubmissions { username, limit } => (
            SUBMISSIONS_QUERY,
            json!({ "username": username, "limit": limit }),
        ),
    }
}

#[async_trait]
impl ProblemProvider for GraphqlProvider {
    fn name(&self) -> &'static str {
        "graphql"
    }

    async fn fetch(
        &self,
        query: &ProblemQuery,
        credential: Option<&PlatformCredential>,
    ) -> Result<ProblemData, ProviderError> {
        let (document, variables) = request_for(query);
        tracing::debug!(%query, authenticated = credential.is_some(), "querying LeetCode GraphQL");

        let data = self.post(document, variables, credential).await?;
        decode(query, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leetcode::Difficulty;

    #[test]
    fn test_search_filters() {
        let query = ProblemQuery::Search {
            keywords: "binary search".to_string(),
            difficulty: Some(Difficulty::Medium),
            limit: 3,
        };
        let (document, variables) = request_for(&query);
        assert!(document.contains("problemsetQuestionList"));
        assert_eq!(variables["filters"]["searchKeywords"], "binary search");
        assert_eq!(variables["filters"]["difficulty"], "MEDIUM");
        assert_eq!(variables["limit"], 3);
    }

    #[test]
    fn test_search_document_declares_every_variable() {
        for name in ["categorySlug", "limit", "skip", "filters"] {
            assert!(SEARCH_QUERY.contains(&format!("${name}:")), "{name} not declared");
            assert!(SEARCH_QUERY.contains(&format!("{name}: ${name}")), "{name} not passed");
        }
    }

    #[test]
    fn test_search_without_keywords_has_empty_filters() {
        let query = ProblemQuery::Search {
            keywords: String::new(),
            difficulty: None,
            limit: 5,
        };
        let (_, variables) = request_for(&query);
        assert_eq!(variables["filters"], json!({}));
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(looks_like_auth_failure("User is not logged in"));
        assert!(looks_like_auth_failure("Authentication required"));
        assert!(!looks_like_auth_failure("Question does not exist"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connectivity_error() {
        let provider = GraphqlProvider::with_endpoint(
            Site::Global,
            "http://127.0.0.1:9/graphql",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider
            .fetch(&ProblemQuery::DailyChallenge, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ProviderErrorKind::Connectivity);
    }
}
