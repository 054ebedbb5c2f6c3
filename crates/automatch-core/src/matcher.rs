//! Engine instance that owns the index, the match engine and the search cache.

use crate::builder::AutoMatcherBuilder;
use crate::config::{EngineConfig, RefreshPolicy};
use crate::error::Result;
use crate::index::{DiskListing, IndexStore, ModelEntry, ReconcileReport};
use crate::matching::{MatchEngine, MatchRequest, MatchResult};
use crate::search::{RemoteCandidate, SearchService};
use tracing::debug;

/// Resolves missing model references against a local model library.
///
/// Nothing is shared between instances. [`reconcile`](Self::reconcile) and
/// [`match_batch`](Self::match_batch) both take `&mut self`, so a snapshot
/// can never be rebuilt while a batch is reading it; callers that share an
/// instance across threads wrap it in a lock.
pub struct AutoMatcher {
    config: EngineConfig,
    store: IndexStore,
    listing: Box<dyn DiskListing>,
    engine: Option<MatchEngine>,
    search: SearchService,
}

impl AutoMatcher {
    pub fn builder(config: EngineConfig) -> AutoMatcherBuilder {
        AutoMatcherBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        store: IndexStore,
        listing: Box<dyn DiskListing>,
        search: SearchService,
    ) -> Self {
        Self {
            config,
            store,
            listing,
            engine: None,
            search,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.config.refresh_policy
    }

    pub fn index(&self) -> &IndexStore {
        &self.store
    }

    /// Indexed entries, in digest order.
    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.store.entries()
    }

    /// Scan the disk listing, update and persist the index.
    pub fn reconcile(&mut self) -> Result<ReconcileReport> {
        let report = self.store.reconcile(self.listing.as_ref())?;
        self.engine = None;
        Ok(report)
    }

    /// Resolve a batch of requests.
    ///
    /// Under [`RefreshPolicy::RebuildPerCall`] the index is reconciled first;
    /// otherwise the last built snapshot is reused until
    /// [`reconcile`](Self::reconcile) or [`invalidate`](Self::invalidate).
    pub fn match_batch(&mut self, requests: &[MatchRequest]) -> Result<Vec<MatchResult>> {
        if self.config.refresh_policy == RefreshPolicy::RebuildPerCall {
            self.reconcile()?;
        }
        Ok(self.engine().match_batch(requests))
    }

    /// Drop the cached match engine and remote search results.
    pub fn invalidate(&mut self) {
        debug!("Invalidating match engine and search cache");
        self.engine = None;
        self.search.invalidate();
    }

    /// Look for a remote download candidate for `filename`.
    pub async fn search_remote(&self, filename: &str) -> Result<Option<RemoteCandidate>> {
        self.search.search(filename, false).await
    }

    pub fn search_service(&self) -> &SearchService {
        &self.search
    }

    fn engine(&mut self) -> &MatchEngine {
        let store = &self.store;
        let config = &self.config;
        self.engine
            .get_or_insert_with(|| MatchEngine::new(store.entries().cloned(), config))
    }
}
