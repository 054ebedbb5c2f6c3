//! Remote download candidates for models that are not on disk.
//!
//! Network providers live outside this crate. They plug in through
//! [`SearchProvider`] and are composed by [`SearchService`], which also owns
//! the result cache. [`PopularModelCatalog`] is the built-in offline provider.

mod catalog;
mod service;
mod terms;

pub use catalog::PopularModelCatalog;
pub use service::SearchService;
pub use terms::extract_search_terms;

use crate::error::Result;
use crate::semantic::{score, split_extension};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A downloadable model found by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCandidate {
    /// Display name, usually `org/repo` or a model title.
    pub name: String,
    pub url: String,
    pub page_url: String,
    /// Human-readable provider label.
    pub source: String,
    pub score: f64,
}

/// What providers receive for one missing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub filename: String,
    /// Last path component without extension.
    pub base_name: String,
    /// Ranked query strings, best first.
    pub terms: Vec<String>,
}

impl SearchQuery {
    pub fn new(filename: &str) -> Self {
        let name_only = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        Self {
            filename: filename.to_string(),
            base_name: split_extension(name_only).0.to_string(),
            terms: extract_search_terms(filename),
        }
    }
}

/// A source of remote candidates (a model hub, a curated table, ...).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &'static str;

    /// Best candidate for `query`, or `None` when the provider has nothing.
    async fn search(&self, query: &SearchQuery) -> Result<Option<RemoteCandidate>>;
}

/// Pick the candidate whose name best matches `base_name`.
///
/// Each candidate is scored against both its repository name and its full
/// `org/repo` name; the best one is kept if it reaches `min_score`
/// (hub providers use [`crate::SearchConfig::MIN_REMOTE_SCORE`]).
pub fn best_remote_match(
    base_name: &str,
    candidates: impl IntoIterator<Item = RemoteCandidate>,
    min_score: f64,
) -> Option<RemoteCandidate> {
    let target = base_name.to_lowercase();
    let mut best: Option<RemoteCandidate> = None;

    for mut candidate in candidates {
        let name = candidate.name.to_lowercase();
        let s = score(&target, &name).max(score(&target, &name.replace('/', " ")));
        if s > best.as_ref().map_or(0.0, |b| b.score) {
            candidate.score = s;
            best = Some(candidate);
        }
    }

    best.filter(|b| b.score >= min_score)
}
