//! Centralized configuration for the AutoMatch engine.
//!
//! Constant groups hold the tuned values the algorithms depend on.
//! [`EngineConfig`] is the runtime configuration a host can load from JSON.

use crate::error::{AutoMatchError, Result};
use crate::persistence::atomic_read_json;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Index and fingerprinting configuration.
pub struct IndexConfig;

impl IndexConfig {
    /// Bytes sampled from the head and from the tail of each file.
    pub const SAMPLE_SIZE: usize = 1024 * 1024; // 1MB
    /// Stored mtime may drift by less than this and still count as unchanged.
    pub const MTIME_TOLERANCE_SECS: f64 = 1.0;
    /// Bump when the on-disk index layout changes incompatibly.
    pub const SCHEMA_VERSION: u32 = 1;
    pub const INDEX_FILENAME: &'static str = "model_index.json";

    pub const MODEL_EXTENSIONS: &'static [&'static str] = &[
        "safetensors",
        "ckpt",
        "pt",
        "pth",
        "bin",
        "gguf",
        "onnx",
        "pkl",
        "sft",
    ];

    /// Model folder keys scanned under a models root.
    pub const MODEL_TYPES: &'static [&'static str] = &[
        "checkpoints",
        "loras",
        "vae",
        "controlnet",
        "upscale_models",
        "embeddings",
        "clip",
        "unet",
        "clip_vision",
        "style_models",
        "diffusers",
    ];
}

/// Scoring and tier thresholds.
pub struct MatchConfig;

impl MatchConfig {
    pub const FUZZY_TOKEN_THRESHOLD: f64 = 0.6;
    pub const CROSS_VARIANT_THRESHOLD: f64 = 0.9;
    pub const LEGACY_CUTOFF: f64 = 0.85;

    pub const JACCARD_WEIGHT: f64 = 0.7;
    pub const SEQUENCE_WEIGHT: f64 = 0.3;
    pub const COVERAGE_BONUS: f64 = 0.15;
    pub const COVERAGE_BONUS_MIN: f64 = 0.9;
}

/// Remote candidate search configuration.
pub struct SearchConfig;

impl SearchConfig {
    pub const MAX_SEARCH_TERMS: usize = 5;
    /// Remote candidates scoring below this are discarded.
    pub const MIN_REMOTE_SCORE: f64 = 0.35;
    pub const CACHE_TTL: Duration = Duration::from_secs(3600);
    pub const CACHE_CAPACITY: u64 = 1024;
    pub const HF_BASE: &'static str = "https://huggingface.co";
}

/// When the match engine's inverted index is brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Reconcile the index from disk before every match batch.
    RebuildPerCall,
    /// Reuse the last snapshot until `reconcile()` or `invalidate()` is called.
    #[default]
    ExplicitRefresh,
}

impl std::str::FromStr for RefreshPolicy {
    type Err = AutoMatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rebuild-per-call" | "rebuild" => Ok(RefreshPolicy::RebuildPerCall),
            "explicit-refresh" | "explicit" => Ok(RefreshPolicy::ExplicitRefresh),
            other => Err(AutoMatchError::Validation {
                field: "refreshPolicy".to_string(),
                message: format!("unknown refresh policy: {}", other),
            }),
        }
    }
}

/// Runtime configuration for an [`crate::AutoMatcher`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Where the persisted index snapshot lives.
    pub index_path: PathBuf,
    pub refresh_policy: RefreshPolicy,
    pub fuzzy_threshold: f64,
    pub variant_threshold: f64,
    pub legacy_cutoff: f64,
    /// Lowercase extensions without the leading dot.
    pub model_extensions: Vec<String>,
    pub model_types: Vec<String>,
    pub keep_index_backup: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(IndexConfig::INDEX_FILENAME),
            refresh_policy: RefreshPolicy::default(),
            fuzzy_threshold: MatchConfig::FUZZY_TOKEN_THRESHOLD,
            variant_threshold: MatchConfig::CROSS_VARIANT_THRESHOLD,
            legacy_cutoff: MatchConfig::LEGACY_CUTOFF,
            model_extensions: IndexConfig::MODEL_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            model_types: IndexConfig::MODEL_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keep_index_backup: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config: EngineConfig = atomic_read_json(path)?.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("fuzzyThreshold", self.fuzzy_threshold),
            ("variantThreshold", self.variant_threshold),
            ("legacyCutoff", self.legacy_cutoff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AutoMatchError::Validation {
                    field: field.to_string(),
                    message: format!("must be within [0, 1], got {}", value),
                });
            }
        }

        if self.model_extensions.is_empty() {
            return Err(AutoMatchError::Validation {
                field: "modelExtensions".to_string(),
                message: "at least one extension is required".to_string(),
            });
        }

        Ok(())
    }

    /// Whether `path` carries one of the configured model extensions.
    pub fn is_model_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.model_extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.') == ext)
            })
            .unwrap_or(false)
    }
}
