//! Search term generation for remote lookups.

use crate::config::SearchConfig;
use crate::semantic::terms::NOISE_SET;
use crate::semantic::{split_extension, strip_variant_terms, tokenize};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Trailing GGUF quant marker on a raw base name (`-Q4_K_S`, `_Q8_0`).
static TRAILING_QUANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[-_]Q\d+[_A-Z0-9]*$").unwrap());
static SPACED_TRAILING_QUANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+Q\d+[_A-Z0-9]*\s*$").unwrap());
static CJK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fff}]").unwrap());
static NAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Build up to five query strings for `filename`, most specific first.
///
/// GGUF files lead with the `<name>-GGUF` repository convention. Names with
/// CJK characters keep them, since hubs index those titles verbatim.
pub fn extract_search_terms(filename: &str) -> Vec<String> {
    let name_only = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (base_name, ext) = split_extension(name_only);

    let mut terms: Vec<String> = Vec::new();
    let contains = |terms: &[String], candidate: &str| {
        let candidate = candidate.to_lowercase();
        terms.iter().any(|t| t.to_lowercase() == candidate)
    };

    if ext.is_some_and(|e| e.eq_ignore_ascii_case("gguf")) {
        let core_name = TRAILING_QUANT.replace(base_name, "").to_string();
        terms.push(format!("{core_name}-GGUF"));
        terms.push(core_name.clone());

        let words: Vec<&str> = core_name.split(['-', '_']).filter(|w| !w.is_empty()).collect();
        if !words.is_empty() {
            terms.push(words.join(" "));
        }
    }

    let cleaned = strip_variant_terms(name_only);
    if !cleaned.is_empty() && !contains(&terms, &cleaned) {
        terms.push(WHITESPACE.replace_all(cleaned.trim(), "-").to_string());
        terms.push(cleaned.clone());
    }

    if CJK.is_match(base_name) {
        let spaced = NAME_SEPARATORS.replace_all(base_name, " ");
        let spaced = SPACED_TRAILING_QUANT.replace(&spaced, "");
        let spaced = spaced.trim();
        if !spaced.is_empty() && !contains(&terms, spaced) {
            terms.push(spaced.to_string());
        }
    }

    let tokens: Vec<String> = tokenize(&cleaned)
        .into_iter()
        .filter(|t| !NOISE_SET.contains(t.as_str()))
        .collect();
    if !tokens.is_empty() {
        let joined = tokens.join(" ");
        if !contains(&terms, &joined) {
            terms.push(joined);
        }
    }

    if terms.is_empty() {
        terms.push(NAME_SEPARATORS.replace_all(base_name, " ").trim().to_string());
    }

    let mut seen = HashSet::new();
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| t.chars().count() > 1 && seen.insert(t.to_lowercase()))
        .take(SearchConfig::MAX_SEARCH_TERMS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gguf_terms_lead_with_repo_convention() {
        let terms = extract_search_terms("unet/qwen-image-edit-2511-Q4_K_S.gguf");
        assert_eq!(
            terms,
            vec![
                "qwen-image-edit-2511-GGUF",
                "qwen-image-edit-2511",
                "qwen image edit 2511",
            ]
        );
    }

    #[test]
    fn test_checkpoint_terms_drop_precision() {
        let terms = extract_search_terms("flux1-dev-fp8.safetensors");
        assert_eq!(terms, vec!["flux1-dev", "flux1 dev", "flux 1 dev"]);
    }

    #[test]
    fn test_cjk_names_are_kept() {
        let terms = extract_search_terms("奶油风-flux-lora_v2.safetensors");
        assert!(terms.iter().any(|t| t.contains("奶油风")));
        assert!(terms.len() <= SearchConfig::MAX_SEARCH_TERMS);
    }

    #[test]
    fn test_terms_are_unique_case_insensitively() {
        let terms = extract_search_terms("Juggernaut_XL_v9.safetensors");
        let lowered: HashSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        assert_eq!(lowered.len(), terms.len());
        assert_eq!(terms[0], "juggernaut-xl-v9");
    }

    #[test]
    fn test_variant_only_name_falls_back_to_raw() {
        let terms = extract_search_terms("fp16.safetensors");
        assert_eq!(terms, vec!["fp16"]);
    }
}
