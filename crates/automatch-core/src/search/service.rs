//! Provider chain with a TTL result cache.

use super::{PopularModelCatalog, RemoteCandidate, SearchProvider, SearchQuery};
use crate::config::SearchConfig;
use crate::error::Result;
use mini_moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Asks providers in order and returns the first hit.
///
/// Results are cached per filename, misses included, so a workflow with
/// many unknown models does not repeat the same lookups. A miss is not
/// cached when a provider failed with a recoverable error; any other
/// provider error is returned to the caller.
pub struct SearchService {
    providers: Vec<Arc<dyn SearchProvider>>,
    cache: Cache<String, Option<RemoteCandidate>>,
}

impl SearchService {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self::with_ttl(providers, SearchConfig::CACHE_TTL)
    }

    pub fn with_ttl(providers: Vec<Arc<dyn SearchProvider>>, ttl: Duration) -> Self {
        Self {
            providers,
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(SearchConfig::CACHE_CAPACITY)
                .build(),
        }
    }

    /// Service backed only by the built-in popular model table.
    pub fn offline() -> Self {
        Self::new(vec![Arc::new(PopularModelCatalog::new())])
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Find a download candidate for `filename`.
    ///
    /// With `ignore_cache` the cache is bypassed for the lookup but still
    /// refreshed with the new result.
    pub async fn search(
        &self,
        filename: &str,
        ignore_cache: bool,
    ) -> Result<Option<RemoteCandidate>> {
        if filename.is_empty() {
            return Ok(None);
        }

        if !ignore_cache {
            if let Some(cached) = self.cache.get(&filename.to_string()) {
                debug!("Search cache hit: {}", filename);
                return Ok(cached);
            }
        }

        let query = SearchQuery::new(filename);
        debug!("Searching {} with terms {:?}", filename, query.terms);

        let mut failed = false;
        let mut found = None;
        for provider in &self.providers {
            match provider.search(&query).await {
                Ok(Some(candidate)) => {
                    info!(
                        "{} found {} for {}",
                        provider.id(),
                        candidate.name,
                        filename
                    );
                    found = Some(candidate);
                    break;
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    warn!("Search provider {} failed: {}", provider.id(), e);
                    failed = true;
                }
                Err(e) => return Err(e),
            }
        }

        if found.is_none() {
            info!("No remote candidate for {}", filename);
            if failed {
                return Ok(None);
            }
        }

        self.cache.insert(filename.to_string(), found.clone());
        Ok(found)
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutoMatchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        answer: Option<&'static str>,
        fail: bool,
    }

    impl CountingProvider {
        fn new(answer: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                answer,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                answer: None,
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchProvider for CountingProvider {
        fn id(&self) -> &'static str {
            "counting"
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Option<RemoteCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AutoMatchError::Provider {
                    provider: "counting".to_string(),
                    message: "offline".to_string(),
                });
            }
            Ok(self.answer.map(|name| RemoteCandidate {
                name: name.to_string(),
                url: format!("https://example.com/{name}"),
                page_url: format!("https://example.com/{name}"),
                source: "counting".to_string(),
                score: 0.8,
            }))
        }
    }

    #[tokio::test]
    async fn test_first_hit_wins() {
        let first = CountingProvider::new(None);
        let second = CountingProvider::new(Some("org/model"));
        let third = CountingProvider::new(Some("org/other"));
        let service = SearchService::new(vec![first.clone(), second.clone(), third.clone()]);

        let hit = service.search("model.safetensors", false).await.unwrap().unwrap();
        assert_eq!(hit.name, "org/model");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_misses_are_cached() {
        let provider = CountingProvider::new(None);
        let service = SearchService::new(vec![provider.clone()]);

        assert!(service.search("unknown.ckpt", false).await.unwrap().is_none());
        assert!(service.search("unknown.ckpt", false).await.unwrap().is_none());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_ignore_cache_and_invalidate() {
        let provider = CountingProvider::new(Some("org/model"));
        let service = SearchService::new(vec![provider.clone()]);

        service.search("model.gguf", false).await.unwrap();
        service.search("model.gguf", true).await.unwrap();
        assert_eq!(provider.calls(), 2);

        service.search("model.gguf", false).await.unwrap();
        assert_eq!(provider.calls(), 2);

        service.invalidate();
        service.search("model.gguf", false).await.unwrap();
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_miss_is_not_cached() {
        let provider = CountingProvider::failing();
        let service = SearchService::new(vec![provider.clone()]);

        assert!(service.search("model.pt", false).await.unwrap().is_none());
        assert!(service.search("model.pt", false).await.unwrap().is_none());
        assert_eq!(provider.calls(), 2);
    }

    struct MisconfiguredProvider;

    #[async_trait]
    impl SearchProvider for MisconfiguredProvider {
        fn id(&self) -> &'static str {
            "misconfigured"
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Option<RemoteCandidate>> {
            Err(AutoMatchError::Config {
                message: "missing API token".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_unrecoverable_provider_error_is_returned() {
        let fallback = CountingProvider::new(Some("org/model"));
        let service = SearchService::new(vec![Arc::new(MisconfiguredProvider), fallback.clone()]);

        let result = service.search("model.safetensors", false).await;
        assert!(matches!(result, Err(AutoMatchError::Config { .. })));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_service_uses_catalog() {
        let service = SearchService::offline();
        assert_eq!(service.provider_ids(), vec!["popular-models"]);
        let hit = service.search("flux1-dev.safetensors", false).await.unwrap().unwrap();
        assert_eq!(hit.name, "black-forest-labs/FLUX.1-dev");
    }

    #[tokio::test]
    async fn test_empty_filename() {
        let service = SearchService::offline();
        assert!(service.search("", false).await.unwrap().is_none());
    }
}
