//! Error types for the AutoMatch engine.
//!
//! Most failures inside the engine are recovered locally (a file that cannot
//! be fingerprinted is skipped, a stale index is rebuilt). The variants here
//! are what is left over for the caller to see.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the AutoMatch engine.
#[derive(Debug, Error)]
pub enum AutoMatchError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Index errors
    #[error("Reconciliation failed: {message}")]
    Reconcile { message: String },

    #[error("Index schema mismatch: expected version {expected}, found {found}")]
    SchemaMismatch { expected: u32, found: u32 },

    // Remote search errors
    #[error("Search provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },
}

/// Result type alias for AutoMatch operations.
pub type Result<T> = std::result::Result<T, AutoMatchError>;

impl From<std::io::Error> for AutoMatchError {
    fn from(err: std::io::Error) -> Self {
        AutoMatchError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for AutoMatchError {
    fn from(err: serde_json::Error) -> Self {
        AutoMatchError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl AutoMatchError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        AutoMatchError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether the engine may swallow this error and carry on.
    ///
    /// Per-file IO failures and a stale index schema are recoverable; a
    /// whole-pass reconciliation failure or a bad configuration is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AutoMatchError::Io { .. }
                | AutoMatchError::SchemaMismatch { .. }
                | AutoMatchError::Provider { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoMatchError::SchemaMismatch {
            expected: 1,
            found: 0,
        };
        assert_eq!(
            err.to_string(),
            "Index schema mismatch: expected version 1, found 0"
        );
    }

    #[test]
    fn test_io_with_path_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = AutoMatchError::io_with_path(io, "/models/a.safetensors");
        match err {
            AutoMatchError::Io { path, .. } => {
                assert_eq!(path, Some(PathBuf::from("/models/a.safetensors")));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_recoverable_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(AutoMatchError::from(io).is_recoverable());
        assert!(!AutoMatchError::Reconcile {
            message: "no model folders".into()
        }
        .is_recoverable());
        assert!(!AutoMatchError::Config {
            message: "bad".into()
        }
        .is_recoverable());
    }
}
