//! Term tables shared by the tokenizer, classifier and search term builder.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Extensions that mark a real model file. Only these are dropped before
/// variant stripping; any other suffix is treated as part of the name.
///
/// Leaving out `sft` is intentional: it is indexed (see
/// `IndexConfig::MODEL_EXTENSIONS`), but `flux1-dev.sft` keeps `sft` as a
/// token and classifies as `ModelFormat::Other`.
pub const MODEL_FILE_EXTENSIONS: &[&str] = &[
    "gguf",
    "safetensors",
    "ckpt",
    "pt",
    "bin",
    "pth",
    "onnx",
    "pkl",
];

/// Words removed when reducing a filename to its core tokens.
pub const VARIANT_TERMS: &[&str] = &[
    // quantization markers
    "q4", "q5", "q6", "q8", "q3", "bf16", "fp16", "fp32", "fp8", "int8", "int4", "q4_0", "q4_1",
    "q5_0", "q5_1", "q8_0", "q4_k", "q4_k_m", "q4_k_s", "q5_k_m", "q5_k_s", "q6_k",
    // residue of split quant markers (Q4_K_S -> k, s)
    "k", "m", "s",
    // formats
    "gguf", "safetensors", "ckpt", "pt", "bin", "pth", "onnx", "pkl",
    // training variants
    "pruned", "ema", "emaonly", "noema", "noembed", "full",
    // release markers
    "fix", "fixed", "final", "official", "release",
    // content ratings
    "sfw", "nsfw",
    // speed variants
    "lightning", "turbo", "hyper", "lcm", "simpo", "8steps", "4steps", "2steps",
];

/// Words that survive variant stripping even when a removal pattern matches.
pub const PROTECTED_TERMS: &[&str] = &[
    "sd", "sd15", "sd21", "sd3", "sdxl", "stable", "diffusion", "base", "refiner", "flux",
    "flux1", "schnell", "dev", "vae", "unet", "lora", "controlnet", "clip", "embeddings", "qwen",
    "llama", "mistral", "realvis", "juggernaut", "inpainting", "instruct", "chat", "vl", "vision",
    "1", "2", "3", "5", "7", "8", "13", "70",
];

/// Functional-variant markers. One present on only one side of a comparison
/// means the two files are different models.
pub const CRITICAL_TERMS: &[&str] = &[
    "vae", "lora", "upscale", "upscaler", "refiner", "detailer", "inpainting", "inpaint",
    "lightning", "turbo", "lcm", "hyper", "1step", "2steps", "4steps", "8steps", "depth", "canny",
    "openpose", "softedge", "scribble", "hed", "mlsd", "normalbae", "seg", "lineart", "lycoris",
    "hypernetwork", "embedding", "motion", "animate", "video",
];

/// Technical suffixes dropped from remote search terms.
pub const NOISE_TERMS: &[&str] = &[
    "fp16", "fp32", "bf16", "int8", "int4", "q4", "q8", "gguf", "f16", "f32", "pruned", "ema",
    "emaonly", "noembed", "noema", "safetensors", "ckpt", "pt", "bin", "pth", "onnx", "pkl", "fix",
    "fixed", "final", "official", "release", "sfw", "nsfw", "lightning", "8steps", "4steps",
    "2steps", "turbo", "lcm", "hyper",
];

fn to_set(terms: &'static [&'static str]) -> HashSet<&'static str> {
    terms.iter().copied().collect()
}

pub static VARIANT_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| to_set(VARIANT_TERMS));
pub static PROTECTED_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| to_set(PROTECTED_TERMS));
pub static CRITICAL_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| to_set(CRITICAL_TERMS));
pub static NOISE_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| to_set(NOISE_TERMS));

pub fn is_critical(token: &str) -> bool {
    CRITICAL_SET.contains(token)
}

/// Whether `ext` (without the dot, any case) is a real model file extension.
pub fn is_model_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    MODEL_FILE_EXTENSIONS.contains(&ext.as_str())
}
