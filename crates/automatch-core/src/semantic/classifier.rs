//! Semantic classification of model filenames.
//!
//! Architecture and quantization tags act as hard compatibility gates when
//! comparing two names; the model format keeps GGUF and checkpoint files
//! from standing in for each other.

use super::terms::is_critical;
use super::tokenizer::{core_tokens, split_extension, tokenize};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static FLUX_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bfl\d?[\-_]").unwrap());
static SD3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"sd3[._]?5|sd3").unwrap());
static SDXL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[\W_]|^)xl(?:[\W_]|$)|sdxl|base_1\.0|refiner|supir").unwrap()
});
static SD15: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v1[\-._]?5|sd15|1\.5|dreamshaper|realistic_vision").unwrap()
});
static SD21: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v2[\-._]?1|sd21|2\.1").unwrap());
static VERSION_GLUED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+(?:\.\d+)+[a-z]+$").unwrap());
static GGUF_QUANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[\W_]|^)(q\d+[a-z0-9_]*)(?:[\W_]|$)").unwrap());

/// Precision markers, checked in this order when no GGUF quant is present.
const PRECISION_MARKERS: &[&str] = &["bf16", "fp16", "fp32", "fp8", "int8", "int4"];

/// Coarse model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Pony,
    Flux,
    Sd3,
    Sdxl,
    Sd15,
    Sd21,
    Hunyuan,
    Auraflow,
    Kwai,
    Qwen,
    Llama,
    Unknown,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Pony => "pony",
            Architecture::Flux => "flux",
            Architecture::Sd3 => "sd3",
            Architecture::Sdxl => "sdxl",
            Architecture::Sd15 => "sd15",
            Architecture::Sd21 => "sd21",
            Architecture::Hunyuan => "hunyuan",
            Architecture::Auraflow => "auraflow",
            Architecture::Kwai => "kwai",
            Architecture::Qwen => "qwen",
            Architecture::Llama => "llama",
            Architecture::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Architecture::Unknown
    }

    /// Two architectures conflict only when both are known and differ.
    pub fn conflicts_with(&self, other: &Architecture) -> bool {
        self.is_known() && other.is_known() && self != other
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage format class of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Gguf,
    Checkpoint,
    Other,
}

impl ModelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Gguf => "gguf",
            ModelFormat::Checkpoint => "checkpoint",
            ModelFormat::Other => "other",
        }
    }

    /// Whether two formats are known and different.
    pub fn conflicts_with(&self, other: &ModelFormat) -> bool {
        *self != ModelFormat::Other && *other != ModelFormat::Other && self != other
    }
}

/// Detect the model family of `filename`.
///
/// Rules are tried in priority order and the first hit wins, so family cues
/// such as `pony` beat the generic `xl` that would otherwise classify the
/// file as SDXL.
pub fn detect_architecture(filename: &str) -> Architecture {
    let lower = filename.to_lowercase();

    if lower.contains("pony") {
        return Architecture::Pony;
    }

    if lower.contains("flux")
        || FLUX_PREFIX.is_match(&lower)
        || lower.contains("awportraitfl")
        || lower.contains("f.1")
    {
        return Architecture::Flux;
    }

    if SD3.is_match(&lower) {
        return Architecture::Sd3;
    }

    if SDXL.is_match(&lower) {
        return Architecture::Sdxl;
    }
    let (stem, _) = split_extension(&lower);
    if stem.ends_with("xl") && !stem.ends_with("pixel") {
        return Architecture::Sdxl;
    }

    if SD15.is_match(&lower) {
        return Architecture::Sd15;
    }
    if SD21.is_match(&lower) {
        return Architecture::Sd21;
    }

    if lower.contains("hunyuan") {
        return Architecture::Hunyuan;
    }
    if lower.contains("aura") && lower.contains("flow") {
        return Architecture::Auraflow;
    }
    if lower.contains("ltx") || lower.contains("kolors") {
        return Architecture::Kwai;
    }

    if lower.contains("qwen") {
        return Architecture::Qwen;
    }
    if lower.contains("llama") {
        return Architecture::Llama;
    }

    Architecture::Unknown
}

/// Detect the quantization or precision tag of `filename`, if any.
///
/// A GGUF quant word (`q4_k_m`, `q8_0`) takes precedence over precision
/// markers.
pub fn detect_quantization(filename: &str) -> Option<String> {
    let lower = filename.to_lowercase();

    if let Some(caps) = GGUF_QUANT.captures(&lower) {
        return Some(caps[1].to_string());
    }

    PRECISION_MARKERS
        .iter()
        .find(|marker| lower.contains(*marker))
        .map(|marker| marker.to_string())
}

pub fn model_format(filename: &str) -> ModelFormat {
    let lower = filename.to_lowercase();
    if lower.ends_with(".gguf") {
        ModelFormat::Gguf
    } else if [".safetensors", ".ckpt", ".pt", ".bin", ".pth"]
        .iter()
        .any(|ext| lower.ends_with(ext))
    {
        ModelFormat::Checkpoint
    } else {
        ModelFormat::Other
    }
}

/// Critical markers of `filename`, compared at token level.
///
/// A marker glued to a dotted version number (`0.9vae`, `v1.5vae`) names the
/// baked-in component of a release, not a functional variant, and is
/// skipped. Markers glued to anything else (`upscale2`, `lora1`) count.
pub fn critical_markers(filename: &str) -> BTreeSet<String> {
    filename
        .to_lowercase()
        .split(['_', '-', ' ', '/', '\\', '[', ']', '(', ')'])
        .filter(|word| !VERSION_GLUED.is_match(word))
        .flat_map(tokenize)
        .filter(|token| is_critical(token))
        .collect()
}

/// Everything the scorer and matcher need to know about one filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticFingerprint {
    pub architecture: Architecture,
    pub quantization: Option<String>,
    pub critical_terms: BTreeSet<String>,
    pub core_tokens: BTreeSet<String>,
    pub format: ModelFormat,
}

impl SemanticFingerprint {
    pub fn of(filename: &str) -> Self {
        Self {
            architecture: detect_architecture(filename),
            quantization: detect_quantization(filename),
            critical_terms: tokenize(filename)
                .into_iter()
                .filter(|t| is_critical(t))
                .collect(),
            core_tokens: core_tokens(filename),
            format: model_format(filename),
        }
    }
}
