//! # sc-gateway
//!
//! The decision gateway — the heart of SafeClaw.
//!
//! A producer (an agent loop) hands [`DecisionGateway::decide`] a raw tool
//! call; the gateway classifies it, applies the workspace guard, approves
//! safe reads locally, and otherwise asks the control plane (polling for
//! human approval when required) before returning a two-valued allow/deny
//! [`Decision`]. Every terminal decision is appended to the
//! audit ledger *before* it is returned, and when no positive verdict can
//! be reached (network failure with no cached allow, timeout, unknown
//! outcome, cancellation) the gateway denies: fail-closed is the default,
//! not the exception.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sc_control::{CancelToken, ControlPlaneClient, ControlPlaneConfig};
//! use sc_gateway::{DecisionGateway, GatewayConfig};
//! use serde_json::json;
//!
//! # async fn run() {
//! let control = ControlPlaneClient::new(
//!     ControlPlaneConfig::new("https://api.authensor.dev", "install-1"),
//! ).unwrap();
//! let gateway = DecisionGateway::new(GatewayConfig::for_profile("default"), Arc::new(control));
//!
//! let decision = gateway
//!     .decide("Bash", &json!({"command": "cargo test"}), &CancelToken::new())
//!     .await;
//! println!("{}: {}", decision.is_allowed(), decision.reason);
//! # }
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod gateway;

pub use config::GatewayConfig;
pub use control::ControlPlane;
pub use error::GatewayError;
pub use events::{EventSink, GatewayEvent, Notifier};
pub use gateway::{Decision, DecisionGateway, PermissionResponse};
