//! Provider chain integration tests

use std::time::Duration;

use voice_qa::error::ProviderErrorKind;
use voice_qa::leetcode::{
    GraphqlProvider, McpProvider, PlatformCredential, ProblemQuery, ProviderChain,
    ProviderLookup, Site,
};

mod common;
use common::{CallOrder, FakeProvider, two_sum_daily};

fn search(keywords: &str) -> ProblemQuery {
    ProblemQuery::Search {
        keywords: keywords.to_string(),
        difficulty: None,
        limit: 3,
    }
}

#[tokio::test]
async fn test_fallback_receives_identical_query() {
    let primary = FakeProvider::failing("mcp", ProviderErrorKind::Connectivity);
    let secondary = FakeProvider::returning("graphql", two_sum_daily());
    let chain = ProviderChain::new()
        .with_provider(Box::new(primary.clone()))
        .with_provider(Box::new(secondary.clone()));
    let credential = PlatformCredential::new("cookie");

    let lookup = chain.lookup(&search("two sum"), credential.as_ref()).await;

    assert_eq!(lookup.found().map(|(_, p)| p), Some("graphql"));
    assert_eq!(primary.calls(), vec![(search("two sum"), true)]);
    assert_eq!(secondary.calls(), primary.calls());
    assert_eq!(chain.last_source(), Some("graphql"));
}

#[tokio::test]
async fn test_first_success_stops_the_chain() {
    let primary = FakeProvider::returning("mcp", two_sum_daily());
    let secondary = FakeProvider::returning("graphql", two_sum_daily());
    let chain = ProviderChain::new()
        .with_provider(Box::new(primary.clone()))
        .with_provider(Box::new(secondary.clone()));

    let lookup = chain.lookup(&ProblemQuery::DailyChallenge, None).await;

    assert_eq!(
        lookup,
        ProviderLookup::Found {
            data: two_sum_daily(),
            provider: "mcp"
        }
    );
    assert!(secondary.calls().is_empty());
}

#[tokio::test]
async fn test_repeated_lookup_is_stable() {
    let order = CallOrder::default();
    let primary = FakeProvider::failing("mcp", ProviderErrorKind::Protocol).logging_to(&order);
    let secondary = FakeProvider::returning("graphql", two_sum_daily()).logging_to(&order);
    let chain = ProviderChain::new()
        .with_provider(Box::new(primary.clone()))
        .with_provider(Box::new(secondary.clone()));

    let first = chain.lookup(&ProblemQuery::DailyChallenge, None).await;
    let second = chain.lookup(&ProblemQuery::DailyChallenge, None).await;

    assert_eq!(first, second);
    assert_eq!(first.found().map(|(_, provider)| provider), Some("graphql"));
    assert_eq!(primary.calls().len(), 2);
    assert_eq!(secondary.calls().len(), 2);
    assert_eq!(
        *order.lock().unwrap(),
        vec!["mcp", "graphql", "mcp", "graphql"]
    );
}

#[tokio::test]
async fn test_rejected_credential_marks_anonymous_only() {
    let chain = ProviderChain::new()
        .with_provider(Box::new(FakeProvider::failing("mcp", ProviderErrorKind::Auth)))
        .with_provider(Box::new(FakeProvider::failing(
            "graphql",
            ProviderErrorKind::Connectivity,
        )));
    let credential = PlatformCredential::new("expired");

    let lookup = chain
        .lookup(
            &ProblemQuery::RecentSubmissions {
                username: "alice".to_string(),
                limit: 5,
            },
            credential.as_ref(),
        )
        .await;

    assert_eq!(
        lookup,
        ProviderLookup::Unavailable {
            anonymous_only: true,
            attempts: vec![
                ("mcp", ProviderErrorKind::Auth),
                ("graphql", ProviderErrorKind::Connectivity),
            ],
        }
    );
    assert_eq!(chain.last_source(), None);
}

#[tokio::test]
async fn test_all_fail_without_auth_problem() {
    let chain = ProviderChain::new()
        .with_provider(Box::new(FakeProvider::failing(
            "mcp",
            ProviderErrorKind::NotFound,
        )))
        .with_provider(Box::new(FakeProvider::failing(
            "graphql",
            ProviderErrorKind::NotFound,
        )));

    let lookup = chain.lookup(&search("nonexistent"), None).await;

    assert!(matches!(
        lookup,
        ProviderLookup::Unavailable {
            anonymous_only: false,
            ..
        }
    ));
    assert!(lookup.found().is_none());
}

#[tokio::test]
async fn test_empty_chain_is_unavailable() {
    let lookup = ProviderChain::new()
        .lookup(&ProblemQuery::DailyChallenge, None)
        .await;

    assert_eq!(
        lookup,
        ProviderLookup::Unavailable {
            anonymous_only: false,
            attempts: Vec::new(),
        }
    );
}

#[tokio::test]
async fn test_cache_skips_providers() {
    let provider = FakeProvider::returning("graphql", two_sum_daily());
    let chain = ProviderChain::new()
        .with_cache(Duration::from_secs(60))
        .with_provider(Box::new(provider.clone()));

    chain.lookup(&ProblemQuery::DailyChallenge, None).await;
    let cached = chain.lookup(&ProblemQuery::DailyChallenge, None).await;

    assert_eq!(cached.found().map(|(_, p)| p), Some("graphql"));
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_cache_keeps_credential_lookups_apart() {
    let provider = FakeProvider::returning("graphql", two_sum_daily());
    let chain = ProviderChain::new()
        .with_cache(Duration::from_secs(60))
        .with_provider(Box::new(provider.clone()));
    let credential = PlatformCredential::new("cookie");

    chain.lookup(&ProblemQuery::DailyChallenge, None).await;
    chain
        .lookup(&ProblemQuery::DailyChallenge, credential.as_ref())
        .await;

    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let provider = FakeProvider::failing("graphql", ProviderErrorKind::Connectivity);
    let chain = ProviderChain::new()
        .with_cache(Duration::from_secs(60))
        .with_provider(Box::new(provider.clone()));

    chain.lookup(&ProblemQuery::DailyChallenge, None).await;
    chain.lookup(&ProblemQuery::DailyChallenge, None).await;

    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_real_providers_unreachable_fall_through() {
    let mcp = McpProvider::new(
        vec!["/nonexistent/leetcode-mcp-server".to_string()],
        Site::Global,
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    let graphql = GraphqlProvider::with_endpoint(
        Site::Global,
        "http://127.0.0.1:9/graphql",
        Duration::from_secs(2),
    )
    .unwrap();
    let chain = ProviderChain::new()
        .with_provider(Box::new(mcp))
        .with_provider(Box::new(graphql));

    let lookup = chain.lookup(&ProblemQuery::DailyChallenge, None).await;

    assert_eq!(
        lookup,
        ProviderLookup::Unavailable {
            anonymous_only: false,
            attempts: vec![
                ("mcp", ProviderErrorKind::Connectivity),
                ("graphql", ProviderErrorKind::Connectivity),
            ],
        }
    );
}
