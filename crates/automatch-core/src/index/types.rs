//! Index data types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::IndexConfig;

/// A model file known to the index, keyed by its content digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub digest: String,
    /// Absolute path of the file at the last reconciliation.
    pub path: String,
    /// Name relative to its model-type folder (e.g. `SDXL/juggernaut.safetensors`).
    pub filename: String,
    /// Model folder key the file was listed under (e.g. `checkpoints`).
    pub type_tag: String,
    pub size_bytes: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
}

impl ModelEntry {
    /// Whether the stored metadata still describes a file of `size_bytes`
    /// modified at `mtime`, allowing for filesystem timestamp jitter.
    pub fn is_unchanged(&self, size_bytes: u64, mtime: f64) -> bool {
        self.size_bytes == size_bytes
            && (self.mtime - mtime).abs() < IndexConfig::MTIME_TOLERANCE_SECS
    }
}

/// Persisted index snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub schema_version: u32,
    /// Seconds since the Unix epoch; zero before the first scan.
    pub last_scan_timestamp: f64,
    pub entries: BTreeMap<String, ModelEntry>,
}

impl Default for IndexSnapshot {
    fn default() -> Self {
        Self {
            schema_version: IndexConfig::SCHEMA_VERSION,
            last_scan_timestamp: 0.0,
            entries: BTreeMap::new(),
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Entries in the index after the pass.
    pub total: usize,
    /// Entries carried over without rehashing.
    pub reused: usize,
    /// Files fingerprinted during this pass (new, modified or moved).
    pub rehashed: usize,
    /// Files that could not be stat'ed or fingerprinted.
    pub skipped: usize,
    /// Digests present before the pass and gone after it.
    pub removed: usize,
    pub elapsed_ms: u64,
    /// False when the snapshot could not be written; the in-memory index is
    /// still authoritative.
    pub persisted: bool,
}
