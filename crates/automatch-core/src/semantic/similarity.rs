//! Bounded similarity score between two model names.

use super::classifier::{detect_architecture, detect_quantization};
use super::terms::is_critical;
use super::tokenizer::{core_tokens, token_set};
use crate::config::MatchConfig;
use similar::TextDiff;
use std::collections::BTreeSet;

/// Jaccard index of two sets; zero when both are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Character-level similarity ratio in `[0, 1]` (`2 * matches / total`).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    TextDiff::from_chars(a, b).ratio() as f64
}

/// A HuggingFace-style GGUF repository name without a concrete quant, which
/// stands for every quantization it ships.
fn is_gguf_wildcard(name: &str, quant: Option<&str>) -> bool {
    let upper = name.to_uppercase();
    quant.is_none() && (upper.ends_with("-GGUF") || upper.contains("/GGUF"))
}

/// Drop a leading `org/` (or directory) prefix.
fn repo_name(name: &str) -> &str {
    name.rsplit_once('/').map(|(_, tail)| tail).unwrap_or(name)
}

/// Score how likely `a` and `b` name the same model, in `[0, 1]`.
///
/// Hard filters return `0.0` before any soft scoring:
/// - both architectures known and different
/// - both quantization tags present and different (a GGUF wildcard
///   repository on one side lifts this check)
/// - a critical marker present on only one side
///
/// Otherwise the result is `0.7 * jaccard + 0.3 * sequence_ratio`, where the
/// Jaccard term is computed over core tokens and gets a coverage bonus.
pub fn score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if detect_architecture(a).conflicts_with(&detect_architecture(b)) {
        return 0.0;
    }

    let quant_a = detect_quantization(a);
    let quant_b = detect_quantization(b);
    let wildcard = (is_gguf_wildcard(a, quant_a.as_deref()) && quant_b.is_some())
        || (is_gguf_wildcard(b, quant_b.as_deref()) && quant_a.is_some());
    if let (Some(qa), Some(qb)) = (&quant_a, &quant_b) {
        if !wildcard && qa != qb {
            return 0.0;
        }
    }

    let name_a = repo_name(a);
    let name_b = repo_name(b);

    let tokens_a = token_set(name_a);
    let tokens_b = token_set(name_b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    if tokens_a
        .symmetric_difference(&tokens_b)
        .any(|t| is_critical(t))
    {
        return 0.0;
    }

    let core_a = core_tokens(name_a);
    let core_b = core_tokens(name_b);
    let token_score = if core_a.is_empty() || core_b.is_empty() {
        jaccard(&tokens_a, &tokens_b)
    } else {
        let mut score = jaccard(&core_a, &core_b);
        let smaller = core_a.len().min(core_b.len());
        let coverage = core_a.intersection(&core_b).count() as f64 / smaller as f64;
        if coverage >= MatchConfig::COVERAGE_BONUS_MIN {
            score = (score + MatchConfig::COVERAGE_BONUS).min(1.0);
        }
        score
    };

    let seq = sequence_ratio(&name_a.to_lowercase(), &name_b.to_lowercase());

    MatchConfig::JACCARD_WEIGHT * token_score + MatchConfig::SEQUENCE_WEIGHT * seq
}
