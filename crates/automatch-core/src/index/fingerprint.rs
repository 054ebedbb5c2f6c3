//! Fast content fingerprint for model files.
//!
//! Hashing a multi-GB checkpoint end to end takes far too long for an
//! interactive scan, so the digest covers the file size, its modification
//! time, the first 1MB and (for larger files) the last 1MB.

use crate::config::IndexConfig;
use crate::error::{AutoMatchError, Result};
use sha2::{Digest, Sha256};
use std::fs::Metadata;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Modification time of `metadata` as fractional seconds since the epoch.
pub fn mtime_secs(metadata: &Metadata) -> std::io::Result<f64> {
    let modified = metadata.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0))
}

/// Compute the identity digest of a model file.
///
/// Returns the SHA256 (lowercase hex) of `"{size}-{mtime}"` followed by the
/// head sample and, when the file is larger than one sample, the tail sample.
pub fn compute_digest(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| AutoMatchError::io_with_path(e, path))?;

    let metadata = file
        .metadata()
        .map_err(|e| AutoMatchError::io_with_path(e, path))?;
    let file_size = metadata.len();
    let mtime = mtime_secs(&metadata).map_err(|e| AutoMatchError::io_with_path(e, path))?;

    let mut hasher = Sha256::new();
    hasher.update(format!("{}-{}", file_size, mtime).as_bytes());

    let sample = IndexConfig::SAMPLE_SIZE as u64;

    let head_len = file_size.min(sample) as usize;
    let mut buffer = vec![0u8; head_len];
    file.read_exact(&mut buffer)
        .map_err(|e| AutoMatchError::io_with_path(e, path))?;
    hasher.update(&buffer);

    if file_size > sample {
        file.seek(SeekFrom::Start(file_size - sample))
            .map_err(|e| AutoMatchError::io_with_path(e, path))?;
        buffer.resize(IndexConfig::SAMPLE_SIZE, 0);
        file.read_exact(&mut buffer)
            .map_err(|e| AutoMatchError::io_with_path(e, path))?;
        hasher.update(&buffer);
    }

    Ok(hex::encode(hasher.finalize()))
}
