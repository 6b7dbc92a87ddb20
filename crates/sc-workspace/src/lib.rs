//! # sc-workspace
//!
//! Workspace path guard for SafeClaw.
//!
//! Before any policy runs, filesystem actions are checked against the
//! detected project workspace: the guard walks upward from the task's
//! starting directory to find the project root, loads (or synthesizes) a
//! scope config, and answers one question — is this path inside the
//! allowed scope? Denied paths always win over allowed paths.
//!
//! The guard never errors: a missing config means "no guard" (everything
//! allowed), and a malformed `.safeclaw.json` falls back to the default
//! scope for that root.

pub mod config;
pub mod guard;

pub use config::WorkspaceConfig;
pub use guard::{detect, is_allowed, Workspace};
