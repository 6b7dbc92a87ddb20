// error.rs — Error types for the decision cache.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting the cache.
///
/// Load-side corruption is not an error: a corrupt cache file is treated
/// as an empty cache and overwritten on the next write.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to write or atomically replace the cache file.
    #[error("failed to persist decision cache at {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the cache map.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
