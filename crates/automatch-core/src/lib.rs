//! AutoMatch Core - model identity resolution for node-based AI workflows.
//!
//! When a workflow references a model file that is no longer where it was
//! (moved, renamed, re-quantized), this crate finds the best local
//! replacement, and otherwise a remote download candidate.
//!
//! - [`index`] keeps a content-addressed index of the local model library
//!   that follows files across moves and renames.
//! - [`semantic`] tokenizes filenames and classifies family, quantization
//!   and format.
//! - [`matching`] resolves references through a tiered strategy.
//! - [`search`] composes remote search providers behind a cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use automatch_core::{AutoMatcher, EngineConfig, MatchRequest};
//!
//! let mut matcher = AutoMatcher::builder(EngineConfig::default())
//!     .models_root("/opt/ComfyUI/models")
//!     .build()?;
//! matcher.reconcile()?;
//!
//! let results = matcher.match_batch(&[MatchRequest::new(12, "SDXL/juggernautXL_v9.safetensors")])?;
//! for result in results {
//!     println!("{} -> {}", result.original_value, result.matched_value);
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod matching;
pub mod persistence;
pub mod search;
pub mod semantic;

mod builder;
mod matcher;

pub use builder::AutoMatcherBuilder;
pub use config::{EngineConfig, IndexConfig, MatchConfig, RefreshPolicy, SearchConfig};
pub use error::{AutoMatchError, Result};
pub use index::{
    compute_digest, DiskListing, FolderListing, IndexSnapshot, IndexStore, ModelEntry,
    ReconcileReport,
};
pub use matcher::AutoMatcher;
pub use matching::{MatchEngine, MatchRequest, MatchResult, MatchTier};
pub use search::{
    best_remote_match, extract_search_terms, PopularModelCatalog, RemoteCandidate, SearchProvider, SearchQuery,
    SearchService,
};
pub use semantic::{score, Architecture, ModelFormat, SemanticFingerprint};
