//! Disk listing collaborator.
//!
//! The index does not walk the disk itself; it asks a [`DiskListing`] for the
//! filenames of each model type and how to resolve them to absolute paths.
//! Hosts that already know their model folders (ComfyUI's `folder_paths`)
//! implement the trait directly, everyone else uses [`FolderListing`].

use crate::error::{AutoMatchError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source of per-type model file listings.
pub trait DiskListing: Send + Sync {
    /// Model type keys to scan, in scan order.
    fn model_types(&self) -> Vec<String>;

    /// Filenames (relative to the type folder, `/`-separated) for one type.
    fn list(&self, model_type: &str) -> Result<Vec<String>>;

    /// Absolute path of `filename` within `model_type`, if it resolves.
    fn full_path(&self, model_type: &str, filename: &str) -> Option<PathBuf>;
}

/// Listing over a models root laid out as `<root>/<model_type>/...`.
#[derive(Debug, Clone)]
pub struct FolderListing {
    root: PathBuf,
    model_types: Vec<String>,
}

impl FolderListing {
    pub fn new(root: impl Into<PathBuf>, model_types: Vec<String>) -> Self {
        Self {
            root: root.into(),
            model_types,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DiskListing for FolderListing {
    fn model_types(&self) -> Vec<String> {
        self.model_types.clone()
    }

    fn list(&self, model_type: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(AutoMatchError::Io {
                message: "models root is not a directory".to_string(),
                path: Some(self.root.clone()),
                source: None,
            });
        }

        let type_dir = self.root.join(model_type);
        if !type_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = WalkDir::new(&type_dir)
            .follow_links(true)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&type_dir).ok()?;
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                Some(parts.join("/"))
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn full_path(&self, model_type: &str, filename: &str) -> Option<PathBuf> {
        let path = filename
            .split('/')
            .fold(self.root.join(model_type), |acc, part| acc.join(part));
        path.is_file().then_some(path)
    }
}
