// envelope.rs — The action envelope data model.
//
// An envelope is the minimal classified description of one tool call:
// a namespaced dotted action type and a bounded resource string. Resources
// are always post-redaction and post-truncation; they may be empty.

use serde::{Deserialize, Serialize};

/// Action types beginning with this prefix are read-only operations the
/// gateway approves locally without contacting the control plane.
pub const SAFE_READ_PREFIX: &str = "safe.read.";

/// The classified identity of one tool call.
///
/// This is the trust boundary: when the gateway asks the control plane for
/// a decision, the envelope (plus principal and timestamp) is everything
/// that is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Namespaced dotted action type, e.g. `code.exec` or `mcp.github.create_issue`.
    #[serde(rename = "type")]
    pub action_type: String,

    /// Sanitized resource string (at most 200 characters, possibly empty).
    pub resource: String,
}

impl ActionEnvelope {
    pub fn new(action_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            resource: resource.into(),
        }
    }

    /// True iff this action is locally approvable without the control plane.
    pub fn is_safe_read(&self) -> bool {
        is_safe_read(&self.action_type)
    }
}

/// True iff `action_type` begins with the safe-read prefix.
pub fn is_safe_read(action_type: &str) -> bool {
    action_type.starts_with(SAFE_READ_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_read_prefix_detection() {
        assert!(is_safe_read("safe.read.file"));
        assert!(is_safe_read("safe.read.meta"));
        assert!(!is_safe_read("safe.readfile"));
        assert!(!is_safe_read("code.exec"));
        assert!(!is_safe_read("filesystem.write"));
    }

    #[test]
    fn envelope_serializes_with_type_key() {
        let envelope = ActionEnvelope::new("code.exec", "ls -la");
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"type":"code.exec","resource":"ls -la"}"#);
    }

    #[test]
    fn envelope_round_trip() {
        let envelope = ActionEnvelope::new("network.http", "https://example.com");
        let json = serde_json::to_string(&envelope).unwrap();
        let restored: ActionEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope, restored);
    }
}
