//! Filename tokenization.
//!
//! Tokens are lowercase runs of letters or runs of digits, never mixed:
//! `flux1-dev` becomes `flux`, `1`, `dev`.

use super::terms::{is_model_extension, PROTECTED_SET, VARIANT_SET};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Characters treated as word separators by [`tokenize`].
const SEPARATORS: &[char] = &['_', '-', '.', ' ', '/', '\\', '[', ']', '(', ')'];

static ALPHA_OR_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+|\d+").unwrap());

/// Separators used when splitting a name into variant candidates.
static VARIANT_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\-_.]+").unwrap());

/// GGUF-style quantization marker (`q4`, `q4_k_m`, `q8_0`).
static QUANT_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^q\d+[a-z0-9_]*$").unwrap());

/// Precision marker (`f16`, `bf16`, `fp8`, `int4`).
static PRECISION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:bf|fp|f|int)\d+$").unwrap());

/// Split `text` into ordered, de-duplicated tokens.
///
/// A separator-delimited part with no ASCII letters or digits (CJK text for
/// instance) is kept whole.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase().replace(SEPARATORS, " ");

    let mut seen = BTreeSet::new();
    let mut tokens = Vec::new();
    for part in lowered.split_whitespace() {
        let mut found = false;
        for m in ALPHA_OR_DIGITS.find_iter(part) {
            found = true;
            if seen.insert(m.as_str().to_string()) {
                tokens.push(m.as_str().to_string());
            }
        }
        if !found && seen.insert(part.to_string()) {
            tokens.push(part.to_string());
        }
    }
    tokens
}

/// Token set of `text`, for set operations.
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

/// Split `name` into stem and extension the way a path library would: the
/// extension starts at the last `.` of the final path component, and a
/// leading dot does not start one.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let component_start = name.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let component = &name[component_start..];
    match component.rfind('.') {
        Some(dot) if component[..dot].chars().any(|c| c != '.') => {
            let split = component_start + dot;
            (&name[..split], Some(&name[split + 1..]))
        }
        _ => (name, None),
    }
}

/// Strip a trailing extension only when it is a real model file extension.
pub fn strip_model_extension(name: &str) -> &str {
    match split_extension(name) {
        (stem, Some(ext)) if is_model_extension(ext) => stem,
        _ => name,
    }
}

/// Remove quantization, format, training, release and speed variant words
/// from `text`, keeping protected domain words.
///
/// The result is lowercase and space-separated; it keeps characters the
/// tokenizer would later split on (`/`, brackets).
pub fn strip_variant_terms(text: &str) -> String {
    let lowered = text.to_lowercase();
    let base = strip_model_extension(&lowered);

    let kept: Vec<&str> = VARIANT_SPLIT
        .split(base)
        .filter(|part| !part.is_empty())
        .filter(|part| {
            if PROTECTED_SET.contains(*part) {
                return true;
            }
            !(VARIANT_SET.contains(*part)
                || QUANT_WORD.is_match(part)
                || PRECISION_WORD.is_match(part))
        })
        .collect();

    kept.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens left after variant stripping.
pub fn core_tokens(text: &str) -> BTreeSet<String> {
    token_set(&strip_variant_terms(text))
}
