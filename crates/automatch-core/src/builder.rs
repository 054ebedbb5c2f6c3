//! Builder for configuring an [`AutoMatcher`].

use crate::config::{EngineConfig, RefreshPolicy};
use crate::error::{AutoMatchError, Result};
use crate::index::{DiskListing, FolderListing, IndexStore};
use crate::search::{PopularModelCatalog, SearchProvider, SearchService};
use crate::AutoMatcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for configuring an [`AutoMatcher`].
///
/// # Example
///
/// ```rust,no_run
/// use automatch_core::{AutoMatcher, EngineConfig, RefreshPolicy};
///
/// let mut matcher = AutoMatcher::builder(EngineConfig::default())
///     .models_root("/opt/ComfyUI/models")
///     .refresh_policy(RefreshPolicy::RebuildPerCall)
///     .build()?;
/// let report = matcher.reconcile()?;
/// println!("{} models indexed", report.total);
/// # Ok::<(), automatch_core::AutoMatchError>(())
/// ```
pub struct AutoMatcherBuilder {
    config: EngineConfig,
    listing: Option<Box<dyn DiskListing>>,
    models_root: Option<PathBuf>,
    providers: Vec<Arc<dyn SearchProvider>>,
    search_ttl: Option<Duration>,
}

impl AutoMatcherBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            listing: None,
            models_root: None,
            providers: vec![Arc::new(PopularModelCatalog::new())],
            search_ttl: None,
        }
    }

    /// Use a host-provided disk listing.
    pub fn listing(mut self, listing: impl DiskListing + 'static) -> Self {
        self.listing = Some(Box::new(listing));
        self
    }

    /// Scan a ComfyUI-style models root (`<root>/<model_type>/...`).
    ///
    /// Ignored when [`listing`](Self::listing) is also set.
    pub fn models_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.models_root = Some(root.into());
        self
    }

    /// Override the refresh policy from the configuration.
    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.config.refresh_policy = policy;
        self
    }

    /// Append a search provider after the ones already configured.
    ///
    /// Default: the built-in popular model table only.
    pub fn with_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Replace the whole provider chain.
    pub fn providers(mut self, providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        self.providers = providers;
        self
    }

    /// How long remote search results stay cached.
    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl = Some(ttl);
        self
    }

    /// Validate the configuration, open the index and build the matcher.
    pub fn build(self) -> Result<AutoMatcher> {
        self.config.validate()?;

        let listing: Box<dyn DiskListing> = match (self.listing, self.models_root) {
            (Some(listing), _) => listing,
            (None, Some(root)) => Box::new(FolderListing::new(root, self.config.model_types.clone())),
            (None, None) => {
                return Err(AutoMatchError::Config {
                    message: "no disk listing or models root configured".to_string(),
                })
            }
        };

        let search = match self.search_ttl {
            Some(ttl) => SearchService::with_ttl(self.providers, ttl),
            None => SearchService::new(self.providers),
        };

        let store = IndexStore::open(&self.config);
        debug!(
            "AutoMatcher ready: {} indexed entries, policy {:?}",
            store.len(),
            self.config.refresh_policy
        );

        Ok(AutoMatcher::from_parts(self.config, store, listing, search))
    }
}
