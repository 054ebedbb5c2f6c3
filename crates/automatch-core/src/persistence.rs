//! Atomic JSON snapshots.
//!
//! Writes go to a temp file named with a PID+TID suffix, are synced, and are
//! then renamed over the target so a reader never sees a half-written index.

use crate::error::{AutoMatchError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AutoMatchError::io_with_path(e, path)),
    };

    let data = serde_json::from_str(&contents).map_err(|e| AutoMatchError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically, optionally keeping the previous
/// version as `<name>.json.bak`.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AutoMatchError::io_with_path(e, parent))?;
    }

    let serialized = serde_json::to_string_pretty(data).map_err(|e| AutoMatchError::Json {
        message: format!("Failed to serialize {}: {}", path.display(), e),
        source: Some(e),
    })?;

    let temp_path = temp_path_for(path);
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| AutoMatchError::io_with_path(e, &temp_path))?;

        file.write_all(serialized.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_all())
            .map_err(|e| AutoMatchError::io_with_path(e, &temp_path))?;
    }

    if keep_backup && path.exists() {
        let backup_path = path.with_extension("json.bak");
        match fs::copy(path, &backup_path) {
            Ok(_) => debug!("Created backup: {}", backup_path.display()),
            Err(e) => warn!("Failed to create backup {}: {}", backup_path.display(), e),
        }
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(AutoMatchError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        });
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    path.with_extension(format!(
        "json.{}.{}.tmp",
        std::process::id(),
        hasher.finish()
    ))
}
