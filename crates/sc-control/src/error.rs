// error.rs — Error types for the control-plane client.

use thiserror::Error;

/// Errors that can occur talking to the control plane.
///
/// The gateway maps every variant to the same fallback (offline cache,
/// else fail-closed deny); the distinctions exist for logging and for
/// callers like `provision_demo` that branch on specific statuses.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The server answered with a non-success status that is not worth
    /// retrying (4xx other than 429).
    #[error("control plane returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Retryable failures (429/5xx) kept failing after the retry budget.
    #[error("control plane retry limit exceeded (last status {0})")]
    RetryLimit(reqwest::StatusCode),

    /// Connection-layer failure (refused, reset, timeout, DNS).
    #[error("control plane transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
}

impl ControlError {
    /// True when the failure was produced by the cancellation token rather
    /// than the network or the server.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
