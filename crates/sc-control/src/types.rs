// types.rs — Wire types for the control-plane API.
//
// Outcome and status vocabularies are closed enums with an explicit
// `Unknown` variant carrying the raw string: a control plane that starts
// returning a verdict this build has never heard of must hit a real branch
// (which the gateway fails closed), not a deserialization error.

use serde::{Deserialize, Serialize};

/// Verdict returned by `POST /evaluate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteOutcome {
    Allow,
    Deny,
    RequireApproval,
    /// Any outcome string this build does not recognize.
    Unknown(String),
}

impl From<String> for RemoteOutcome {
    fn from(value: String) -> Self {
        match value.as_str() {
            "allow" => Self::Allow,
            "deny" => Self::Deny,
            "require_approval" => Self::RequireApproval,
            _ => Self::Unknown(value),
        }
    }
}

impl From<RemoteOutcome> for String {
    fn from(value: RemoteOutcome) -> Self {
        match value {
            RemoteOutcome::Allow => "allow".to_string(),
            RemoteOutcome::Deny => "deny".to_string(),
            RemoteOutcome::RequireApproval => "require_approval".to_string(),
            RemoteOutcome::Unknown(raw) => raw,
        }
    }
}

/// Lifecycle state of an approval receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReceiptStatus {
    Pending,
    Approved,
    Allowed,
    Rejected,
    Denied,
    Expired,
    /// Any status string this build does not recognize; treated as still
    /// pending by the polling loop.
    Unknown(String),
}

impl ReceiptStatus {
    /// Terminal statuses that resolve the approval positively.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Approved | Self::Allowed)
    }

    /// Terminal statuses that resolve the approval negatively.
    pub fn is_refused(&self) -> bool {
        matches!(self, Self::Rejected | Self::Denied | Self::Expired)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_granted() || self.is_refused()
    }
}

impl From<String> for ReceiptStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "allowed" => Self::Allowed,
            "rejected" => Self::Rejected,
            "denied" => Self::Denied,
            "expired" => Self::Expired,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ReceiptStatus> for String {
    fn from(value: ReceiptStatus) -> Self {
        match value {
            ReceiptStatus::Pending => "pending".to_string(),
            ReceiptStatus::Approved => "approved".to_string(),
            ReceiptStatus::Allowed => "allowed".to_string(),
            ReceiptStatus::Rejected => "rejected".to_string(),
            ReceiptStatus::Denied => "denied".to_string(),
            ReceiptStatus::Expired => "expired".to_string(),
            ReceiptStatus::Unknown(raw) => raw,
        }
    }
}

/// Response body of `POST /evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub outcome: RemoteOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response body of `GET /receipts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub status: ReceiptStatus,
}

/// One row of `GET /receipts?status=…`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub id: String,
    pub status: ReceiptStatus,
}

/// Response body of `POST /provision/demo`; a 404 means the endpoint is
/// not available and surfaces as `None`, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionDemo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}
