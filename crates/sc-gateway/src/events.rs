// events.rs — Approval lifecycle events and notification seams.
//
// When a decision enters (and leaves) the approval wait, the gateway
// emits events to a producer-supplied sink and to any configured
// notifiers (webhook, SMS — implemented outside the core). Both seams are
// fire-and-forget: delivery failures are logged and swallowed, and
// notifier calls run on spawned tasks so they can never block or delay
// the decision itself.

use async_trait::async_trait;
use serde::Serialize;

use sc_audit::DecisionOutcome;
use sc_classify::RiskSignal;

use crate::error::GatewayError;

/// Events emitted around the approval wait.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A decision is paused awaiting human approval.
    #[serde(rename_all = "camelCase")]
    ApprovalRequired {
        receipt_id: String,
        action_type: String,
        /// Sanitized resource — safe to show a human reviewer.
        resource: String,
        risk_signals: Vec<RiskSignal>,
    },
    /// The approval wait ended (grant, refusal, timeout, or abort).
    #[serde(rename_all = "camelCase")]
    ApprovalResolved {
        receipt_id: String,
        outcome: DecisionOutcome,
    },
}

/// Synchronous event sink for producer progress streams.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &GatewayEvent);
}

/// Asynchronous out-of-band notifier (webhook poster, SMS sender).
///
/// Invoked on a spawned task; errors are logged by the gateway and never
/// reach the decision path.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: GatewayEvent) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_required_serializes_for_observers() {
        let event = GatewayEvent::ApprovalRequired {
            receipt_id: "r3".into(),
            action_type: "code.exec".into(),
            resource: "deploy".into(),
            risk_signals: vec![RiskSignal::PipeToExternal],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"approval_required\""));
        assert!(json.contains("\"receiptId\":\"r3\""));
        assert!(json.contains("\"riskSignals\":[\"pipe_to_external\"]"));
    }

    #[test]
    fn approval_resolved_carries_outcome() {
        let event = GatewayEvent::ApprovalResolved {
            receipt_id: "r3".into(),
            outcome: DecisionOutcome::Allow,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"approval_resolved\""));
        assert!(json.contains("\"outcome\":\"allow\""));
    }
}
