// error.rs — Error types for the policy store.
//
// Unlike audit and cache failures, a policy load failure is never silent:
// a document the store cannot parse must surface to the caller rather than
// be papered over with a default.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during policy storage operations.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Filesystem failure while reading or writing a policy file.
    #[error("policy io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The policy file exists but is not a valid document.
    #[error("failed to parse policy at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A requested backup version does not exist.
    #[error("policy version v{version} not found at {path}")]
    VersionNotFound { path: PathBuf, version: u32 },

    /// Failed to serialize a document for writing.
    #[error("policy serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
