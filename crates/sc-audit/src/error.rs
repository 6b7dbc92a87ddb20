// error.rs — Error types for the audit subsystem.
//
// Callers on the decision path swallow these (an audit write failure must
// never change the decision returned to the agent), but they still carry
// enough context to log usefully.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open or create the ledger file.
    #[error("failed to open audit ledger at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to append a line to the ledger.
    #[error("failed to append audit entry: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to serialize or deserialize an entry.
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to rename the ledger during rotation.
    #[error("failed to rotate audit ledger at {path}: {source}")]
    RotateFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}
