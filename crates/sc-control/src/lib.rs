//! # sc-control
//!
//! JSON-over-HTTPS client for the authensor control plane.
//!
//! The gateway uses this crate to evaluate envelopes, poll approval
//! receipts, and upload policy documents. Requests authenticate with a
//! bearer token, retry transient failures with exponential backoff
//! (honouring `Retry-After`), and observe a caller-supplied
//! [`CancelToken`] so an aborted decision never keeps retrying in the
//! background.
//!
//! Only the classified envelope, the principal, and a timestamp are ever
//! sent — file contents and API keys stay on the machine.

pub mod cancel;
pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use cancel::CancelToken;
pub use client::{ControlPlaneClient, ControlPlaneConfig};
pub use error::ControlError;
pub use types::{
    EvaluateResponse, ProvisionDemo, Receipt, ReceiptStatus, ReceiptSummary, RemoteOutcome,
};

// Consumers match on HTTP statuses in `ControlError` without needing their
// own reqwest dependency.
pub use reqwest::StatusCode;
