// entry.rs — Audit entry data model.
//
// One entry per terminal decision, one JSON object per line. The camelCase
// field names are a stable contract: dashboards and CSV exporters outside
// the core parse these lines, so renames are breaking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sc_classify::RiskSignal;

/// Sentinel `prevHash` value for the first chained entry in a file.
pub const GENESIS: &str = "GENESIS";

/// The terminal outcome returned to the producer. Two-valued:
/// `require_approval` is an intermediate state that always resolves to one
/// of these before anything is returned or recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Allow,
    Deny,
}

/// Which part of the decision path produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Locally approved safe-read action; the control plane was never asked.
    LocalPrefilter,
    /// The workspace guard rejected a filesystem path before policy ran.
    WorkspaceDeny,
    /// The authensor control plane decided (directly or via approval).
    Authensor,
    /// A cached positive decision answered while the control plane was
    /// unreachable.
    OfflineCache,
    /// No positive verdict was reachable; denied fail-closed.
    FailClosed,
}

/// A single audit entry — one line in the JSONL ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// When the decision was made (UTC, RFC-3339).
    pub timestamp: DateTime<Utc>,

    /// The producer's tool name as received (e.g. "Bash").
    pub tool_name: String,

    /// The classified dotted action type.
    pub action_type: String,

    /// Sanitized resource string from the envelope.
    pub resource: String,

    /// The decision returned to the producer.
    pub outcome: DecisionOutcome,

    /// Control-plane receipt correlating an approval flow, when one existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,

    /// Producer-supplied task correlation id, when one was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// The policy profile active for this decision.
    pub profile: String,

    /// Which path of the gateway produced the outcome.
    pub source: DecisionSource,

    /// Advisory risk signals attached by the classifier (possibly empty).
    #[serde(default)]
    pub risk_signals: Vec<RiskSignal>,

    /// SHA-256 of the previous raw line, or `"GENESIS"` for the first
    /// chained entry. Absent on legacy lines written before chaining.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
}

impl AuditEntry {
    /// Create an entry stamped now, on the `default` profile.
    ///
    /// `prev_hash` is left empty — the ledger fills it in at append time.
    pub fn new(
        tool_name: impl Into<String>,
        action_type: impl Into<String>,
        resource: impl Into<String>,
        outcome: DecisionOutcome,
        source: DecisionSource,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            tool_name: tool_name.into(),
            action_type: action_type.into(),
            resource: resource.into(),
            outcome,
            receipt_id: None,
            task_id: None,
            profile: "default".to_string(),
            source,
            risk_signals: Vec::new(),
            prev_hash: None,
        }
    }

    /// Set the profile and return self (builder pattern).
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the receipt id and return self.
    pub fn with_receipt(mut self, receipt_id: impl Into<String>) -> Self {
        self.receipt_id = Some(receipt_id.into());
        self
    }

    /// Set the task id and return self.
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Attach risk signals and return self.
    pub fn with_risk_signals(mut self, signals: Vec<RiskSignal>) -> Self {
        self.risk_signals = signals;
        self
    }
}
