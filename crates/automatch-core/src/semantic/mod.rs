//! Filename semantics: tokens, model family, quantization and similarity.

mod classifier;
mod similarity;
pub mod terms;
mod tokenizer;

pub use classifier::{
    critical_markers, detect_architecture, detect_quantization, model_format, Architecture,
    ModelFormat, SemanticFingerprint,
};
pub use similarity::{jaccard, score, sequence_ratio};
pub use tokenizer::{
    core_tokens, split_extension, strip_model_extension, strip_variant_terms, token_set, tokenize,
};
