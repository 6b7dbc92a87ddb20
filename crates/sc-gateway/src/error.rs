// error.rs — Error types for gateway seams.
//
// `decide` itself is infallible: every failure mode folds into a deny
// decision. The only errors here belong to the pluggable notification
// seam, and the gateway swallows those too (with a log line).

use thiserror::Error;

/// Errors surfaced by gateway collaborators.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A notifier failed to deliver; never affects the decision.
    #[error("notification delivery failed: {0}")]
    Notification(String),
}
