//! # sc-audit
//!
//! Append-only decision ledger for SafeClaw.
//!
//! Every terminal decision the gateway returns is recorded as an
//! [`AuditEntry`] in a JSONL file. Each line carries the SHA-256 hash of
//! the previous raw line (`prevHash`), forming a tamper-evident chain that
//! [`AuditLedger::verify`] can walk forward and re-check.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use sc_audit::{AuditEntry, AuditLedger, DecisionOutcome, DecisionSource};
//!
//! let ledger = AuditLedger::new("/tmp/audit.jsonl");
//! let mut entry = AuditEntry::new(
//!     "Bash",
//!     "code.exec",
//!     "cargo test",
//!     DecisionOutcome::Allow,
//!     DecisionSource::Authensor,
//! );
//! ledger.append(&mut entry).unwrap();
//! ```

pub mod entry;
pub mod error;
pub mod hasher;
pub mod ledger;

pub use entry::{AuditEntry, DecisionOutcome, DecisionSource, GENESIS};
pub use error::AuditError;
pub use ledger::{AuditLedger, ReadFilter, VerifyReport};
