//! Built-in table of well-known ComfyUI models.

use super::{RemoteCandidate, SearchProvider, SearchQuery};
use crate::config::SearchConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Base name (no extension) to HuggingFace repository id.
const POPULAR_MODELS: &[(&str, &str)] = &[
    // SD 1.5
    ("v1-5-pruned-emaonly", "Comfy-Org/stable-diffusion-v1-5-archive"),
    ("v1-5-pruned-emaonly-fp16", "Comfy-Org/stable-diffusion-v1-5-archive"),
    ("v1-5-pruned", "Comfy-Org/stable-diffusion-v1-5-archive"),
    ("512-inpainting-ema", "runwayml/stable-diffusion-inpainting"),
    // SDXL
    ("sd_xl_base_1.0", "stabilityai/stable-diffusion-xl-base-1.0"),
    ("sd_xl_base_1.0_0.9vae", "stabilityai/stable-diffusion-xl-base-1.0"),
    ("sd_xl_refiner_1.0", "stabilityai/stable-diffusion-xl-refiner-1.0"),
    ("sd_xl_refiner_1.0_0.9vae", "stabilityai/stable-diffusion-xl-refiner-1.0"),
    ("sdxl_vae", "madebyollin/sdxl-vae-fp16-fix"),
    ("juggernautXL_juggXIByRundiffusion", "RunDiffusion/Juggernaut-XI-v11"),
    // SD3 / SD3.5
    ("sd3_medium", "stabilityai/stable-diffusion-3-medium"),
    ("sd3_medium_incl_clips", "stabilityai/stable-diffusion-3-medium"),
    ("sd3.5_large", "stabilityai/stable-diffusion-3.5-large"),
    ("sd3.5_large_turbo", "stabilityai/stable-diffusion-3.5-large-turbo"),
    ("sd3.5_medium", "stabilityai/stable-diffusion-3.5-medium"),
    ("sd3.5_large_fp8_scaled", "Comfy-Org/stable-diffusion-3.5-fp8"),
    ("sd3.5_medium_incl_clips_t5xxlfp8scaled", "Comfy-Org/stable-diffusion-3.5-fp8"),
    // Flux
    ("flux1-dev", "black-forest-labs/FLUX.1-dev"),
    ("flux1-schnell", "black-forest-labs/FLUX.1-schnell"),
    ("flux1-dev-fp8", "Comfy-Org/flux1-dev"),
    ("flux1-schnell-fp8", "Comfy-Org/flux1-schnell"),
    // Text encoders
    ("clip_l", "Comfy-Org/stable-diffusion-3.5-fp8"),
    ("clip_g", "Comfy-Org/stable-diffusion-3.5-fp8"),
    ("t5xxl", "comfyanonymous/flux_text_encoders"),
    ("t5xxl_fp16", "comfyanonymous/flux_text_encoders"),
    ("t5xxl_fp8_e4m3fn", "comfyanonymous/flux_text_encoders"),
    ("t5xxl_fp8_e4m3fn_scaled", "comfyanonymous/flux_text_encoders"),
    ("clip_vision_g", "comfyanonymous/clip_vision_g"),
    // VAE
    ("ae", "Comfy-Org/Lumina_Image_2.0_Repackaged"),
    ("vae-ft-mse-840000-ema-pruned", "stabilityai/sd-vae-ft-mse"),
    // SUPIR
    ("SUPIR-v0F", "Kijai/SUPIR_pruned"),
    ("SUPIR-v0F_fp16", "Kijai/SUPIR_pruned"),
    ("SUPIR-v0Q", "Kijai/SUPIR_pruned"),
    ("SUPIR-v0Q_fp16", "Kijai/SUPIR_pruned"),
    // AuraFlow
    ("aura_flow_0.2", "fal/AuraFlow-v0.2"),
    ("aura_flow_0.3", "fal/AuraFlow-v0.3"),
    // LTX-Video
    ("ltx-video-2b-v0.9", "Lightricks/LTX-Video"),
    ("ltx-2-19b-distilled", "Lightricks/LTX-Video-0.9.7"),
    ("ltx-2-19b-distilled-fp8", "Lightricks/LTX-Video-0.9.7"),
    // Mochi
    ("mochi_preview_fp8_scaled", "genmo/mochi-1-preview"),
    ("mochi_preview", "genmo/mochi-1-preview"),
    // Stable Video Diffusion
    ("svd", "stabilityai/stable-video-diffusion-img2vid"),
    ("svd_xt", "stabilityai/stable-video-diffusion-img2vid-xt"),
    ("svd_xt_1_1", "stabilityai/stable-video-diffusion-img2vid-xt-1-1"),
    // Audio
    ("stable-audio-open-1_0", "stabilityai/stable-audio-open-1.0"),
    ("ace_step_v1_3.5b", "ACE-Step/ACE-Step-v1-3.5B"),
    // ControlNet
    ("sd3.5_large_controlnet_canny", "stabilityai/stable-diffusion-3.5-controlnets"),
    ("sd3.5_large_controlnet_depth", "stabilityai/stable-diffusion-3.5-controlnets"),
    ("sd3.5_large_controlnet_blur", "stabilityai/stable-diffusion-3.5-controlnets"),
    // Acceleration LoRAs
    ("Hyper-SD15-8steps-lora", "ByteDance/Hyper-SD"),
    ("LCM_LoRA_SDv15", "latent-consistency/lcm-lora-sdv1-5"),
    ("TCD-SD15-LoRA", "h1t/TCD-SD15-LoRA"),
    ("Hyper-SDXL-8steps-lora", "ByteDance/Hyper-SD"),
    ("Hyper-SDXL-8steps-lora_rank1", "ByteDance/Hyper-SD"),
    ("LCM_LoRA_Weights_SDXL", "latent-consistency/lcm-lora-sdxl"),
    ("TCD-SDXL-LoRA", "h1t/TCD-SDXL-LoRA"),
    ("sdxl_lightning_2step_lora", "ByteDance/SDXL-Lightning"),
    ("sdxl_lightning_4step_lora", "ByteDance/SDXL-Lightning"),
    ("sdxl_lightning_8step_lora", "ByteDance/SDXL-Lightning"),
    ("FLUX.1-Turbo-Alpha", "alimama-creative/FLUX.1-Turbo-Alpha"),
    ("FLUX.1-Turbo-Alpha-LoRA-8-Step_v1", "alimama-creative/FLUX.1-Turbo-Alpha"),
    // Other popular checkpoints
    ("dreamshaper_8", "Lykon/DreamShaper"),
    ("realvisxl_v5.0", "SG161222/RealVisXL_V5.0"),
    ("juggernaut_xl", "RunDiffusion/Juggernaut-XL-v9"),
];

/// Extensions stripped before lookup.
const LOOKUP_EXTENSIONS: &[&str] = &[".safetensors", ".gguf", ".ckpt", ".pt", ".bin", ".pth"];

/// Precision suffixes retried without when the exact name is not listed.
const PRECISION_SUFFIXES: &[&str] = &["-fp8", "-fp16", "-bf16", "_fp8", "_fp16", "_bf16"];

/// Offline provider for official and widely mirrored ComfyUI models.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopularModelCatalog;

impl PopularModelCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Look up `filename` and return `(repo_id, matched_key)`.
    pub fn lookup(&self, filename: &str) -> Option<(&'static str, &'static str)> {
        let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        let lower = name.to_lowercase();
        let base = LOOKUP_EXTENSIONS
            .iter()
            .find_map(|ext| lower.strip_suffix(ext))
            .unwrap_or(lower.as_str());

        find_key(base).or_else(|| {
            PRECISION_SUFFIXES
                .iter()
                .find_map(|suffix| base.strip_suffix(suffix))
                .and_then(find_key)
        })
    }

    pub fn len(&self) -> usize {
        POPULAR_MODELS.len()
    }

    pub fn is_empty(&self) -> bool {
        POPULAR_MODELS.is_empty()
    }
}

fn find_key(base: &str) -> Option<(&'static str, &'static str)> {
    POPULAR_MODELS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(base))
        .map(|&(key, repo)| (repo, key))
}

#[async_trait]
impl SearchProvider for PopularModelCatalog {
    fn id(&self) -> &'static str {
        "popular-models"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Option<RemoteCandidate>> {
        Ok(self.lookup(&query.filename).map(|(repo, _)| RemoteCandidate {
            name: repo.to_string(),
            url: format!("{}/{}/tree/main", SearchConfig::HF_BASE, repo),
            page_url: format!("{}/{}", SearchConfig::HF_BASE, repo),
            source: "HuggingFace (ComfyUI official)".to_string(),
            score: 1.0,
        }))
    }
}
