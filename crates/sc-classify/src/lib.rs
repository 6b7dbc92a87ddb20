//! # sc-classify
//!
//! Tool-call classification for SafeClaw.
//!
//! Maps a raw `(tool_name, tool_input)` pair from an agent producer into a
//! vendor-neutral [`ActionEnvelope`] (a dotted action type plus a sanitized
//! resource string) and a set of advisory [`RiskSignal`]s. The envelope is
//! the only data about a tool call that ever leaves the machine; the resource
//! is redacted and truncated at construction, so downstream components cannot
//! accidentally leak what the classifier already scrubbed.
//!
//! ## Quick Example
//!
//! ```rust
//! use sc_classify::classify;
//! use serde_json::json;
//!
//! let c = classify("Read", &json!({"file_path": "/tmp/notes.txt"}));
//! assert_eq!(c.envelope.action_type, "safe.read.file");
//! assert!(c.envelope.is_safe_read());
//! ```

pub mod classify;
pub mod envelope;
pub mod risk;

pub use classify::{classify, Classification};
pub use envelope::{is_safe_read, ActionEnvelope, SAFE_READ_PREFIX};
pub use risk::RiskSignal;
