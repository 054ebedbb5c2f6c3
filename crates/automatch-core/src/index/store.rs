//! Digest-keyed model index with incremental reconciliation.
//!
//! The index maps content digests to [`ModelEntry`] records. A reconciliation
//! pass compares the disk listing against the previous snapshot:
//!
//! - same path, same size, mtime within tolerance: entry reused, no hashing
//! - anything else (new, modified or moved file): fingerprinted again
//! - entries not seen on disk: dropped
//!
//! Because the key is the digest and not the path, a file moved to another
//! folder reappears under its old digest with the new path.

use super::fingerprint::{compute_digest, mtime_secs};
use super::listing::DiskListing;
use super::types::{IndexSnapshot, ModelEntry, ReconcileReport};
use crate::config::{EngineConfig, IndexConfig};
use crate::error::{AutoMatchError, Result};
use crate::persistence::{atomic_read_json, atomic_write_json};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// A model file observed on disk during a pass.
#[derive(Debug, Clone)]
struct DiskFile {
    type_tag: String,
    filename: String,
    size_bytes: u64,
    mtime: f64,
}

/// Owner of the model index snapshot and its persisted copy.
pub struct IndexStore {
    index_path: PathBuf,
    keep_backup: bool,
    config: EngineConfig,
    snapshot: IndexSnapshot,
}

impl IndexStore {
    /// Open the index configured by `config`.
    ///
    /// A missing, unreadable or outdated snapshot yields an empty index; the
    /// next reconciliation rebuilds it from scratch.
    pub fn open(config: &EngineConfig) -> Self {
        let snapshot = match load_snapshot(&config.index_path) {
            Ok(Some(snapshot)) => {
                debug!(
                    "Loaded index with {} entries from {}",
                    snapshot.entries.len(),
                    config.index_path.display()
                );
                snapshot
            }
            Ok(None) => IndexSnapshot::default(),
            Err(AutoMatchError::SchemaMismatch { expected, found }) => {
                info!(
                    "Index schema version {} does not match {}, rebuilding",
                    found, expected
                );
                IndexSnapshot::default()
            }
            Err(e) => {
                warn!("Failed to load index, starting empty: {}", e);
                IndexSnapshot::default()
            }
        };

        Self {
            index_path: config.index_path.clone(),
            keep_backup: config.keep_index_backup,
            config: config.clone(),
            snapshot,
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.entries.is_empty()
    }

    /// Entries in digest order.
    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.snapshot.entries.values()
    }

    pub fn get(&self, digest: &str) -> Option<&ModelEntry> {
        self.snapshot.entries.get(digest)
    }

    /// Bring the index in line with what `listing` reports on disk and
    /// persist the result.
    ///
    /// Per-file failures are skipped. The pass only fails as a whole when no
    /// model type could be listed at all.
    pub fn reconcile(&mut self, listing: &dyn DiskListing) -> Result<ReconcileReport> {
        let start = Instant::now();
        info!("Starting incremental scan");

        let mut report = ReconcileReport::default();
        let disk_files = self.collect_disk_files(listing, &mut report)?;

        let path_to_digest: HashMap<&str, &str> = self
            .snapshot
            .entries
            .iter()
            .map(|(digest, entry)| (entry.path.as_str(), digest.as_str()))
            .collect();

        let mut next_entries: BTreeMap<String, ModelEntry> = BTreeMap::new();

        for (path, file) in &disk_files {
            let path_str = path.to_string_lossy().to_string();

            let previous = path_to_digest
                .get(path_str.as_str())
                .and_then(|digest| self.snapshot.entries.get(*digest));
            if let Some(entry) = previous {
                if entry.is_unchanged(file.size_bytes, file.mtime) {
                    next_entries.insert(entry.digest.clone(), entry.clone());
                    report.reused += 1;
                    continue;
                }
            }

            let digest = match compute_digest(path) {
                Ok(digest) => digest,
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.rehashed += 1;

            if let Some(existing) = next_entries.get(&digest) {
                debug!(
                    "{} has the same digest as {}, keeping the later path",
                    path_str, existing.path
                );
            }

            next_entries.insert(
                digest.clone(),
                ModelEntry {
                    digest,
                    path: path_str,
                    filename: file.filename.clone(),
                    type_tag: file.type_tag.clone(),
                    size_bytes: file.size_bytes,
                    mtime: file.mtime,
                },
            );
        }

        report.removed = self
            .snapshot
            .entries
            .keys()
            .filter(|digest| !next_entries.contains_key(*digest))
            .count();
        report.total = next_entries.len();

        self.snapshot = IndexSnapshot {
            schema_version: IndexConfig::SCHEMA_VERSION,
            last_scan_timestamp: now_secs(),
            entries: next_entries,
        };

        report.persisted = match self.persist() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save index: {}", e);
                false
            }
        };
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scan finished in {}ms. Total: {}, Reused: {}, Rehashed: {}, Skipped: {}, Removed: {}",
            report.elapsed_ms,
            report.total,
            report.reused,
            report.rehashed,
            report.skipped,
            report.removed
        );

        Ok(report)
    }

    /// Write the current snapshot to disk.
    pub fn persist(&self) -> Result<()> {
        atomic_write_json(&self.index_path, &self.snapshot, self.keep_backup)
    }

    fn collect_disk_files(
        &self,
        listing: &dyn DiskListing,
        report: &mut ReconcileReport,
    ) -> Result<BTreeMap<PathBuf, DiskFile>> {
        let model_types = listing.model_types();
        let mut disk_files = BTreeMap::new();
        let mut failed_types = Vec::new();

        for model_type in &model_types {
            let filenames = match listing.list(model_type) {
                Ok(filenames) => filenames,
                Err(e) => {
                    warn!("Error listing files for {}: {}", model_type, e);
                    failed_types.push(model_type.clone());
                    continue;
                }
            };

            if filenames.is_empty() {
                debug!("No models found for type: {}", model_type);
                continue;
            }
            debug!("Scanning {} files for {}", filenames.len(), model_type);

            for filename in filenames {
                let Some(full_path) = listing.full_path(model_type, &filename) else {
                    continue;
                };
                if !self.config.is_model_file(&full_path) {
                    continue;
                }
                if disk_files.contains_key(&full_path) {
                    continue;
                }

                let metadata = match std::fs::metadata(&full_path) {
                    Ok(metadata) if metadata.is_file() => metadata,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Cannot stat {}: {}", full_path.display(), e);
                        report.skipped += 1;
                        continue;
                    }
                };
                let mtime = match mtime_secs(&metadata) {
                    Ok(mtime) => mtime,
                    Err(e) => {
                        warn!("Cannot read mtime of {}: {}", full_path.display(), e);
                        report.skipped += 1;
                        continue;
                    }
                };

                disk_files.insert(
                    full_path,
                    DiskFile {
                        type_tag: model_type.clone(),
                        filename,
                        size_bytes: metadata.len(),
                        mtime,
                    },
                );
            }
        }

        if !model_types.is_empty() && failed_types.len() == model_types.len() {
            return Err(AutoMatchError::Reconcile {
                message: format!(
                    "could not list any model type ({})",
                    failed_types.join(", ")
                ),
            });
        }

        Ok(disk_files)
    }
}

/// Load a snapshot, rejecting one written with another schema version.
fn load_snapshot(path: &Path) -> Result<Option<IndexSnapshot>> {
    let Some(raw) = atomic_read_json::<serde_json::Value>(path)? else {
        return Ok(None);
    };

    let found = raw
        .get("schemaVersion")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);
    if found != IndexConfig::SCHEMA_VERSION {
        return Err(AutoMatchError::SchemaMismatch {
            expected: IndexConfig::SCHEMA_VERSION,
            found,
        });
    }

    Ok(Some(serde_json::from_value(raw)?))
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
