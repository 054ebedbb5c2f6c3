//! Tiered resolution of missing model references.
//!
//! The engine is built once from an index snapshot and then answers any
//! number of requests. For each request the tiers are tried in order and the
//! first hit wins:
//!
//! 1. exact normalized name
//! 2. exact basename
//! 3. plain-token overlap over the inverted index
//! 4. cross-variant match on core tokens, same file format only
//! 5. character-level closeness of the whole name
//!
//! Tiers 3 to 5 never cross a compatibility boundary: different known
//! architectures, different critical markers or conflicting file formats.
//! Tiers 3 and 5 additionally refuse different quantizations, which is what
//! tier 4 exists to bridge. Equal set scores in tiers 3 and 4 are broken by
//! the overall name similarity ([`crate::semantic::score`]).

use super::types::{MatchRequest, MatchResult, MatchTier};
use crate::config::EngineConfig;
use crate::index::ModelEntry;
use crate::semantic::{
    core_tokens, critical_markers, detect_architecture, detect_quantization, jaccard,
    model_format, score as name_similarity, sequence_ratio, split_extension, token_set,
    Architecture, ModelFormat,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Name without extension, lowercased.
fn normalize_name(name: &str) -> String {
    split_extension(name).0.trim().to_lowercase()
}

/// Last path component without extension, lowercased.
fn basename(name: &str) -> String {
    let unified = name.replace('\\', "/");
    let last = unified.rsplit('/').next().unwrap_or(&unified);
    normalize_name(last)
}

/// Precomputed view of one name, shared by requests and candidates.
#[derive(Debug, Clone)]
struct NameProfile {
    normalized: String,
    base: String,
    tokens: BTreeSet<String>,
    core: BTreeSet<String>,
    architecture: Architecture,
    quantization: Option<String>,
    critical: BTreeSet<String>,
    format: ModelFormat,
}

impl NameProfile {
    fn new(name: &str) -> Self {
        let base = basename(name);
        Self {
            normalized: normalize_name(name),
            tokens: token_set(&base),
            core: core_tokens(&base),
            architecture: detect_architecture(name),
            quantization: detect_quantization(name),
            critical: critical_markers(&base),
            format: model_format(name),
            base,
        }
    }

    /// Same model family, same functional markers, no format conflict.
    fn compatible(&self, other: &NameProfile) -> bool {
        !self.architecture.conflicts_with(&other.architecture)
            && self.critical == other.critical
            && !self.format.conflicts_with(&other.format)
    }

    fn same_quantization(&self, other: &NameProfile) -> bool {
        match (&self.quantization, &other.quantization) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

struct Candidate {
    entry: ModelEntry,
    profile: NameProfile,
}

/// A hit from one of the tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Position in [`MatchEngine::entries`].
    pub entry: usize,
    pub tier: MatchTier,
    pub score: f64,
}

/// Lookup structures over one index snapshot.
pub struct MatchEngine {
    candidates: Vec<Candidate>,
    full_names: HashMap<String, usize>,
    basenames: HashMap<String, usize>,
    token_index: HashMap<String, BTreeSet<usize>>,
    core_index: HashMap<String, BTreeSet<usize>>,
    fuzzy_threshold: f64,
    variant_threshold: f64,
    legacy_cutoff: f64,
}

impl MatchEngine {
    /// Build the lookup maps and inverted indexes.
    ///
    /// Entries are ordered by path, so ties and duplicate names always
    /// resolve to the same file.
    pub fn new(entries: impl IntoIterator<Item = ModelEntry>, config: &EngineConfig) -> Self {
        let mut entries: Vec<ModelEntry> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.filename.cmp(&b.filename)));

        let mut engine = Self {
            candidates: Vec::with_capacity(entries.len()),
            full_names: HashMap::new(),
            basenames: HashMap::new(),
            token_index: HashMap::new(),
            core_index: HashMap::new(),
            fuzzy_threshold: config.fuzzy_threshold,
            variant_threshold: config.variant_threshold,
            legacy_cutoff: config.legacy_cutoff,
        };

        for (i, entry) in entries.into_iter().enumerate() {
            let profile = NameProfile::new(&entry.filename);

            engine
                .full_names
                .entry(profile.normalized.clone())
                .or_insert(i);
            engine
                .full_names
                .entry(entry.filename.to_lowercase())
                .or_insert(i);
            engine.basenames.entry(profile.base.clone()).or_insert(i);

            for token in &profile.tokens {
                engine.token_index.entry(token.clone()).or_default().insert(i);
            }
            for token in &profile.core {
                engine.core_index.entry(token.clone()).or_default().insert(i);
            }

            engine.candidates.push(Candidate { entry, profile });
        }

        debug!(
            "Built match engine: {} entries, {} tokens, {} core tokens",
            engine.candidates.len(),
            engine.token_index.len(),
            engine.core_index.len()
        );
        engine
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Entries in match order (sorted by path).
    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.candidates.iter().map(|c| &c.entry)
    }

    pub fn entry(&self, index: usize) -> Option<&ModelEntry> {
        self.candidates.get(index).map(|c| &c.entry)
    }

    /// Resolve every request, in order. Only requests whose best match
    /// differs from their current value produce a result.
    pub fn match_batch(&self, requests: &[MatchRequest]) -> Vec<MatchResult> {
        let mut results = Vec::new();

        for request in requests {
            if request.current_value.is_empty() {
                continue;
            }
            let Some(hit) = self.resolve(&request.current_value) else {
                debug!("No match for {}", request.current_value);
                continue;
            };

            let entry = &self.candidates[hit.entry].entry;
            if entry.filename == request.current_value {
                continue;
            }

            debug!(
                "Matched {} -> {} ({}, {:.3})",
                request.current_value, entry.filename, hit.tier, hit.score
            );
            results.push(MatchResult {
                id: request.id.clone(),
                node_type: request.node_type.clone(),
                widget_name: request.widget_name.clone(),
                original_value: request.current_value.clone(),
                matched_value: entry.filename.clone(),
                path: entry.path.clone(),
                tier: hit.tier,
                score: hit.score,
            });
        }

        info!(
            "Matched {} of {} requests against {} entries",
            results.len(),
            requests.len(),
            self.candidates.len()
        );
        results
    }

    /// Find the best local candidate for `value`.
    pub fn resolve(&self, value: &str) -> Option<Resolution> {
        if value.is_empty() {
            return None;
        }
        let target = NameProfile::new(value);

        self.exact_name(&target, value)
            .or_else(|| self.exact_basename(&target))
            .or_else(|| self.token_overlap(&target))
            .or_else(|| self.cross_variant(&target))
            .or_else(|| self.fuzzy(&target))
    }

    fn exact_name(&self, target: &NameProfile, value: &str) -> Option<Resolution> {
        self.full_names
            .get(&target.normalized)
            .or_else(|| self.full_names.get(&value.to_lowercase()))
            .map(|&entry| Resolution {
                entry,
                tier: MatchTier::ExactName,
                score: 1.0,
            })
    }

    fn exact_basename(&self, target: &NameProfile) -> Option<Resolution> {
        self.basenames.get(&target.base).map(|&entry| Resolution {
            entry,
            tier: MatchTier::Basename,
            score: 1.0,
        })
    }

    fn token_overlap(&self, target: &NameProfile) -> Option<Resolution> {
        let candidates = gather(&self.token_index, &target.tokens);

        let mut best: Option<(usize, (f64, f64))> = None;
        for i in candidates {
            let profile = &self.candidates[i].profile;
            if !target.compatible(profile) || !target.same_quantization(profile) {
                continue;
            }
            let rank = (
                jaccard(&target.tokens, &profile.tokens),
                name_similarity(&target.base, &profile.base),
            );
            if best.map_or(true, |(_, r)| rank > r) {
                best = Some((i, rank));
            }
        }

        best.filter(|&(_, (score, _))| score >= self.fuzzy_threshold)
            .map(|(entry, (score, _))| Resolution {
                entry,
                tier: MatchTier::TokenOverlap,
                score,
            })
    }

    fn cross_variant(&self, target: &NameProfile) -> Option<Resolution> {
        if target.core.is_empty() {
            return None;
        }
        let candidates = gather(&self.core_index, &target.core);

        let mut best: Option<(usize, (f64, f64))> = None;
        for i in candidates {
            let profile = &self.candidates[i].profile;
            if profile.core.is_empty()
                || profile.format != target.format
                || !target.compatible(profile)
            {
                continue;
            }
            let rank = (
                jaccard(&target.core, &profile.core),
                name_similarity(&target.base, &profile.base),
            );
            if best.map_or(true, |(_, r)| rank > r) {
                best = Some((i, rank));
            }
        }

        best.filter(|&(_, (score, _))| score >= self.variant_threshold)
            .map(|(entry, (score, _))| Resolution {
                entry,
                tier: MatchTier::CrossVariant,
                score,
            })
    }

    fn fuzzy(&self, target: &NameProfile) -> Option<Resolution> {
        let mut best: Option<(usize, f64)> = None;

        for (i, candidate) in self.candidates.iter().enumerate() {
            let profile = &candidate.profile;
            if !target.compatible(profile) || !target.same_quantization(profile) {
                continue;
            }
            let keys = [
                profile.normalized.clone(),
                candidate.entry.filename.to_lowercase(),
            ];
            for key in &keys {
                let ratio = sequence_ratio(&target.normalized, key);
                if ratio >= self.legacy_cutoff && best.map_or(true, |(_, s)| ratio > s) {
                    best = Some((i, ratio));
                }
            }
        }

        best.map(|(entry, score)| Resolution {
            entry,
            tier: MatchTier::Fuzzy,
            score,
        })
    }
}

/// Union of the inverted-index buckets for `tokens`, in entry order.
fn gather(index: &HashMap<String, BTreeSet<usize>>, tokens: &BTreeSet<String>) -> BTreeSet<usize> {
    tokens
        .iter()
        .filter_map(|t| index.get(t))
        .flatten()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(filename: &str) -> ModelEntry {
        ModelEntry {
            digest: format!("digest-{filename}"),
            path: format!("/models/checkpoints/{filename}"),
            filename: filename.to_string(),
            type_tag: "checkpoints".to_string(),
            size_bytes: 1,
            mtime: 0.0,
        }
    }

    fn engine(filenames: &[&str]) -> MatchEngine {
        MatchEngine::new(
            filenames.iter().map(|f| entry(f)),
            &EngineConfig::default(),
        )
    }

    fn catalog() -> MatchEngine {
        engine(&[
            "sd_xl_base_1.0.safetensors",
            "v1-5-pruned-emaonly.ckpt",
            "custom_folder/my_model_v1.safetensors",
            "lora_v1.safetensors",
        ])
    }

    fn match_one(engine: &MatchEngine, value: &str) -> Option<MatchResult> {
        let mut results = engine.match_batch(&[MatchRequest::new(1, value)]);
        assert!(results.len() <= 1);
        results.pop()
    }

    #[test]
    fn test_exact_match_other_extension() {
        let result = match_one(&catalog(), "v1-5-pruned-emaonly.pt").unwrap();
        assert_eq!(result.matched_value, "v1-5-pruned-emaonly.ckpt");
        assert_eq!(result.tier, MatchTier::ExactName);
    }

    #[test]
    fn test_basename_ignores_directories() {
        let result =
            match_one(&catalog(), "Internet/Models/v1-5-pruned-emaonly.ckpt").unwrap();
        assert_eq!(result.matched_value, "v1-5-pruned-emaonly.ckpt");
        assert_eq!(result.tier, MatchTier::Basename);
        assert_eq!(result.path, "/models/checkpoints/v1-5-pruned-emaonly.ckpt");
    }

    #[test]
    fn test_windows_separators_in_request() {
        let result = match_one(&catalog(), "old\\place\\v1-5-pruned-emaonly.ckpt").unwrap();
        assert_eq!(result.tier, MatchTier::Basename);
    }

    #[test]
    fn test_token_overlap_match() {
        let result = match_one(&catalog(), "sd_xl_base_1.0_0.9vae.safetensors").unwrap();
        assert_eq!(result.matched_value, "sd_xl_base_1.0.safetensors");
        assert_eq!(result.tier, MatchTier::TokenOverlap);
        assert!(result.score >= 0.6);
    }

    #[test]
    fn test_case_insensitive() {
        let result = match_one(&catalog(), "SD_XL_BASE_1.0.safetensors").unwrap();
        assert_eq!(result.matched_value, "sd_xl_base_1.0.safetensors");
    }

    #[test]
    fn test_no_false_positive() {
        assert!(match_one(&catalog(), "totally_unknown_model.ckpt").is_none());
    }

    #[test]
    fn test_correct_value_is_left_alone() {
        assert!(match_one(&catalog(), "sd_xl_base_1.0.safetensors").is_none());
        assert!(match_one(&catalog(), "").is_none());
    }

    #[test]
    fn test_gguf_never_matches_checkpoint() {
        let engine = engine(&["QwenImageEdit/qwen-image-edit-2511-Q4_K_S.gguf"]);
        assert!(match_one(&engine, "qwen_image_edit_2511_bf16.safetensors").is_none());
    }

    #[test]
    fn test_precision_variant_resolves_cross_variant() {
        let engine = engine(&[
            "qwen-image-edit-2511-Q4_K_S.gguf",
            "qwen_image_edit_2511_fp16.safetensors",
        ]);
        let result = match_one(&engine, "qwen_image_edit_2511_bf16.safetensors").unwrap();
        assert_eq!(result.matched_value, "qwen_image_edit_2511_fp16.safetensors");
        assert_eq!(result.tier, MatchTier::CrossVariant);
        assert!(result.score >= 0.9);
    }

    #[test]
    fn test_gguf_quant_variant() {
        let engine = engine(&[
            "Qwen_Image_Edit_2511_Q4_K_M.gguf",
            "Qwen_Image_Edit_2511_fp16.safetensors",
        ]);
        let result = match_one(&engine, "Qwen_Image_Edit_2511_Q5_K_M.gguf").unwrap();
        assert_eq!(result.matched_value, "Qwen_Image_Edit_2511_Q4_K_M.gguf");
        assert_eq!(result.tier, MatchTier::CrossVariant);
    }

    #[test]
    fn test_critical_marker_blocks_every_tier() {
        let engine = engine(&["4x_model.pth"]);
        assert!(match_one(&engine, "4x_upscale_model.pth").is_none());
    }

    #[test]
    fn test_critical_marker_glued_to_digits_blocks_tiers() {
        let upscalers = engine(&["4x_model.pth"]);
        assert!(upscalers.resolve("4x_upscale2_model.pth").is_none());

        let loras = engine(&["detail_tweaker_xl.safetensors"]);
        assert!(loras.resolve("detail_tweaker_xl_lora1.safetensors").is_none());
    }

    #[test]
    fn test_token_overlap_tie_broken_by_similarity() {
        let engine = engine(&[
            "juggernaut_xl_v2_beta.safetensors",
            "juggernaut_xl_v2_zalpha.safetensors",
        ]);
        let result = match_one(&engine, "juggernaut_xl_v2_alpha.safetensors").unwrap();
        assert_eq!(result.tier, MatchTier::TokenOverlap);
        assert_eq!(result.matched_value, "juggernaut_xl_v2_zalpha.safetensors");
    }

    #[test]
    fn test_architecture_blocks_fuzzy_tiers() {
        let engine = engine(&["Juggernaut_v7_SD15.safetensors"]);
        assert!(match_one(&engine, "Juggernaut_XL.safetensors").is_none());
    }

    #[test]
    fn test_fuzzy_tier_catches_typos() {
        let engine = engine(&["realvisxl_v4.0.safetensors"]);
        let result = match_one(&engine, "realvisxl_v40.safetensors").unwrap();
        assert_eq!(result.tier, MatchTier::Fuzzy);
        assert!(result.score >= 0.85);
    }

    #[test]
    fn test_results_keep_request_order() {
        let engine = catalog();
        let requests = vec![
            MatchRequest::new(3, "SD_XL_BASE_1.0.safetensors"),
            MatchRequest::new(1, "nothing_like_it.bin"),
            MatchRequest::new(2, "v1-5-pruned-emaonly.pt"),
        ];
        let results = engine.match_batch(&requests);
        let ids: Vec<_> = results.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![serde_json::json!(3), serde_json::json!(2)]);
    }

    #[test]
    fn test_duplicate_basename_prefers_first_path() {
        let engine = engine(&["b/model.safetensors", "a/model.safetensors"]);
        let result = match_one(&engine, "model.ckpt").unwrap();
        assert_eq!(result.matched_value, "a/model.safetensors");
    }
}
