//! Ordered provider fallback

use std::sync::Mutex;
use std::time::Duration;

use mini_moka::sync::Cache;

use super::{PlatformCredential, ProblemData, ProblemProvider, ProblemQuery};
use crate::error::ProviderErrorKind;

/// Outcome of a chain lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderLookup {
    /// A provider produced data
    Found {
        /// The data
        data: ProblemData,
        /// Name of the provider that produced it
        provider: &'static str,
    },
    /// Every provider failed
    Unavailable {
        /// A credential was rejected somewhere, so at best anonymous data was possible
        anonymous_only: bool,
        /// Each provider tried, with its failure kind
        attempts: Vec<(&'static str, ProviderErrorKind)>,
    },
}

impl ProviderLookup {
    /// Data and provider name, when found
    #[must_use]
    pub const fn found(&self) -> Option<(&ProblemData, &'static str)> {
        match self {
            Self::Found { data, provider } => Some((data, *provider)),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Providers tried in priority order until one succeeds
///
/// The first provider added has the highest priority.
pub struct ProviderChain {
    providers: Vec<Box<dyn ProblemProvider>>,
    last_source: Mutex<Option<&'static str>>,
    cache: Option<Cache<(ProblemQuery, bool), (ProblemData, &'static str)>>,
}

impl Default for ProviderChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderChain {
    /// Create an empty chain without caching
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            last_source: Mutex::new(None),
            cache: None,
        }
    }

    /// Cache successful lookups for `ttl`
    #[must_use]
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(Cache::builder().max_capacity(256).time_to_live(ttl).build());
        self
    }

    /// Append a provider with lower priority than those already added
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn ProblemProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Provider names in priority order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Provider that served the most recent successful lookup
    #[must_use]
    pub fn last_source(&self) -> Option<&'static str> {
        self.last_source.lock().ok().and_then(|guard| *guard)
    }

    fn record_source(&self, provider: &'static str) {
        if let Ok(mut guard) = self.last_source.lock() {
            *guard = Some(provider);
        }
    }

    /// Look up a query, falling back through providers in order
    ///
    /// Every provider receives the same query and credential. A provider
    /// that rejects the credential is skipped like any other failure.
    pub async fn lookup(
        &self,
        query: &ProblemQuery,
        credential: Option<&PlatformCredential>,
    ) -> ProviderLookup {
        let key = (query.clone(), credential.is_some());
        if let Some((data, provider)) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            tracing::debug!(%query, provider, "provider cache hit");
            self.record_source(provider);
            return ProviderLookup::Found { data, provider };
        }

        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.fetch(query, credential).await {
                Ok(data) => {
                    tracing::info!(provider = provider.name(), %query, "problem data found");
                    self.record_source(provider.name());
                    if let Some(cache) = &self.cache {
                        cache.insert(key, (data.clone(), provider.name()));
                    }
                    return ProviderLookup::Found {
                        data,
                        provider: provider.name(),
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        kind = %e.kind,
                        error = %e.message,
                        "provider failed, trying next"
                    );
                    attempts.push((provider.name(), e.kind));
                }
            }
        }

        let anonymous_only = attempts
            .iter()
            .any(|(_, kind)| *kind == ProviderErrorKind::Auth);
        ProviderLookup::Unavailable {
            anonymous_only,
            attempts,
        }
    }
}
