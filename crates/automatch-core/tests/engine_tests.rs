//! End-to-end tests for the AutoMatcher public interface.
//!
//! Each test builds a small ComfyUI-style models tree in a temp dir, scans
//! it and resolves requests through the facade.

use automatch_core::{
    AutoMatchError, AutoMatcher, DiskListing, EngineConfig, MatchRequest, MatchTier,
    RefreshPolicy, Result,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a models tree with the given `type/relative/name` files.
fn create_test_env(files: &[&str]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::create_dir_all(temp_dir.path().join("models")).unwrap();
    for file in files {
        add_file(temp_dir.path(), file);
    }
    temp_dir
}

fn add_file(root: &Path, relative: &str) -> PathBuf {
    let path = root.join("models").join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, format!("weights of {relative}")).unwrap();
    path
}

fn config(root: &Path) -> EngineConfig {
    EngineConfig {
        index_path: root.join("state").join("model_index.json"),
        ..EngineConfig::default()
    }
}

fn matcher(root: &Path) -> AutoMatcher {
    AutoMatcher::builder(config(root))
        .models_root(root.join("models"))
        .build()
        .unwrap()
}

fn resolve(matcher: &mut AutoMatcher, value: &str) -> Option<String> {
    matcher
        .match_batch(&[MatchRequest::new(1, value)])
        .unwrap()
        .pop()
        .map(|r| r.matched_value)
}

#[test]
fn test_scan_then_match_workflow_references() {
    let temp_dir = create_test_env(&[
        "checkpoints/SDXL/sd_xl_base_1.0.safetensors",
        "checkpoints/v1-5-pruned-emaonly.ckpt",
        "unet/qwen_image_edit_2511_fp16.safetensors",
        "unet/gguf/qwen-image-edit-2511-Q4_K_S.gguf",
        "upscale_models/4x_model.pth",
        "loras/add_detail.safetensors",
    ]);
    let mut matcher = matcher(temp_dir.path());

    let report = matcher.reconcile().unwrap();
    assert_eq!(report.total, 6);
    assert!(report.persisted);

    let requests = vec![
        MatchRequest::new(1, "Internet/Models/v1-5-pruned-emaonly.ckpt"),
        MatchRequest::new(2, "qwen_image_edit_2511_bf16.safetensors"),
        MatchRequest::new(3, "SDXL/sd_xl_base_1.0.safetensors"),
        MatchRequest::new(4, "completely_unrelated_thing.ckpt"),
    ];
    let results = matcher.match_batch(&requests).unwrap();

    let by_id: HashMap<String, _> = results.iter().map(|r| (r.id.to_string(), r)).collect();
    assert_eq!(by_id.len(), 2);

    let basename = by_id["1"];
    assert_eq!(basename.matched_value, "v1-5-pruned-emaonly.ckpt");
    assert_eq!(basename.tier, MatchTier::Basename);
    assert!(Path::new(&basename.path).is_file());

    let variant = by_id["2"];
    assert_eq!(variant.matched_value, "qwen_image_edit_2511_fp16.safetensors");
    assert_eq!(variant.tier, MatchTier::CrossVariant);
}

#[test]
fn test_moved_file_is_followed() {
    let temp_dir = create_test_env(&["checkpoints/juggernautXL_v9.safetensors"]);
    let mut matcher = matcher(temp_dir.path());
    matcher.reconcile().unwrap();
    let digest = matcher.entries().next().unwrap().digest.clone();

    let old = temp_dir.path().join("models/checkpoints/juggernautXL_v9.safetensors");
    let new = temp_dir.path().join("models/checkpoints/SDXL/juggernautXL_v9.safetensors");
    std::fs::create_dir_all(new.parent().unwrap()).unwrap();
    std::fs::rename(&old, &new).unwrap();

    matcher.reconcile().unwrap();
    let entries: Vec<_> = matcher.entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].digest, digest);
    assert_eq!(entries[0].filename, "SDXL/juggernautXL_v9.safetensors");

    assert_eq!(
        resolve(&mut matcher, "juggernautXL_v9.safetensors").as_deref(),
        Some("SDXL/juggernautXL_v9.safetensors")
    );
}

#[test]
fn test_index_is_reused_across_instances() {
    let temp_dir = create_test_env(&["vae/ae.safetensors", "clip/clip_l.safetensors"]);

    let mut first = matcher(temp_dir.path());
    first.reconcile().unwrap();
    drop(first);

    let mut second = matcher(temp_dir.path());
    assert_eq!(second.entries().count(), 2);
    let report = second.reconcile().unwrap();
    assert_eq!(report.reused, 2);
    assert_eq!(report.rehashed, 0);

    let raw = std::fs::read_to_string(config(temp_dir.path()).index_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["schemaVersion"], 1);
    assert_eq!(json["entries"].as_object().unwrap().len(), 2);
}

#[test]
fn test_invalidate_rebuilds_engine_from_snapshot() {
    let temp_dir = create_test_env(&["loras/detail_tweaker.safetensors"]);
    let mut matcher = matcher(temp_dir.path());
    matcher.reconcile().unwrap();

    assert_eq!(
        resolve(&mut matcher, "old/detail_tweaker.safetensors").as_deref(),
        Some("detail_tweaker.safetensors")
    );
    matcher.invalidate();
    assert_eq!(
        resolve(&mut matcher, "old/detail_tweaker.safetensors").as_deref(),
        Some("detail_tweaker.safetensors")
    );
}

#[test]
fn test_rebuild_per_call_policy() {
    let temp_dir = create_test_env(&[]);
    let mut matcher = AutoMatcher::builder(config(temp_dir.path()))
        .models_root(temp_dir.path().join("models"))
        .refresh_policy(RefreshPolicy::RebuildPerCall)
        .build()
        .unwrap();

    assert!(resolve(&mut matcher, "t5xxl_fp16.sft").is_none());
    add_file(temp_dir.path(), "clip/t5xxl_fp16.safetensors");
    assert_eq!(
        resolve(&mut matcher, "t5xxl_fp16.sft").as_deref(),
        Some("t5xxl_fp16.safetensors")
    );
}

#[test]
fn test_missing_models_root_is_a_reconcile_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut matcher = matcher(temp_dir.path());
    let result = matcher.reconcile();
    assert!(matches!(result, Err(AutoMatchError::Reconcile { .. })));
}

/// A host that knows its model folders without a shared root.
struct HostListing {
    folders: HashMap<String, PathBuf>,
}

impl DiskListing for HostListing {
    fn model_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.folders.keys().cloned().collect();
        types.sort();
        types
    }

    fn list(&self, model_type: &str) -> Result<Vec<String>> {
        let Some(dir) = self.folders.get(model_type) else {
            return Ok(Vec::new());
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| AutoMatchError::io_with_path(e, dir))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn full_path(&self, model_type: &str, filename: &str) -> Option<PathBuf> {
        let path = self.folders.get(model_type)?.join(filename);
        path.is_file().then_some(path)
    }
}

#[test]
fn test_host_provided_listing() {
    let temp_dir = TempDir::new().unwrap();
    let extra = temp_dir.path().join("extra_checkpoints");
    std::fs::create_dir_all(&extra).unwrap();
    std::fs::write(extra.join("dreamshaper_8.safetensors"), b"dream").unwrap();
    std::fs::write(extra.join("notes.txt"), b"not a model").unwrap();

    let listing = HostListing {
        folders: HashMap::from([("checkpoints".to_string(), extra)]),
    };
    let mut matcher = AutoMatcher::builder(config(temp_dir.path()))
        .listing(listing)
        .build()
        .unwrap();

    let report = matcher.reconcile().unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(
        resolve(&mut matcher, "SD15/dreamshaper_8.ckpt").as_deref(),
        Some("dreamshaper_8.safetensors")
    );
}

#[tokio::test]
async fn test_remote_search_for_unresolved_reference() {
    let temp_dir = create_test_env(&[]);
    let mut matcher = matcher(temp_dir.path());
    matcher.reconcile().unwrap();

    assert!(resolve(&mut matcher, "flux1-schnell-fp8.safetensors").is_none());
    let candidate = matcher
        .search_remote("flux1-schnell-fp8.safetensors")
        .await
        .unwrap()
        .expect("catalog hit");
    assert_eq!(candidate.name, "Comfy-Org/flux1-schnell");
    assert_eq!(candidate.page_url, "https://huggingface.co/Comfy-Org/flux1-schnell");
}
