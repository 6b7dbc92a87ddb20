// gateway.rs — The per-call decision state machine.
//
// classify → workspace guard → safe-read local allow → remote evaluation
// → (cache | deny | approval wait) → audit → return. The ordering
// guarantees are strict for a single call: classification precedes the
// workspace check, which precedes any remote traffic, and the audit
// append precedes the returned decision on every path, fail-closed ones
// included.
//
// Concurrency: each decide() runs as an independent cooperative task. The
// ledger and cache serialize internally; no lock is held across an await.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use sc_audit::{AuditEntry, AuditLedger, DecisionOutcome, DecisionSource};
use sc_cache::{CachedOutcome, DecisionCache};
use sc_classify::{classify, ActionEnvelope, RiskSignal};
use sc_control::{CancelToken, EvaluateResponse, ReceiptStatus, RemoteOutcome};
use sc_workspace::WorkspaceConfig;

use crate::config::GatewayConfig;
use crate::control::ControlPlane;
use crate::events::{EventSink, GatewayEvent, Notifier};

/// The two-valued decision returned to the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    pub reason: String,
}

impl Decision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            outcome: DecisionOutcome::Allow,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            outcome: DecisionOutcome::Deny,
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == DecisionOutcome::Allow
    }

    /// The producer-facing hook shape.
    pub fn to_permission_response(&self) -> PermissionResponse {
        PermissionResponse {
            permission_decision: self.outcome,
            permission_decision_reason: self.reason.clone(),
        }
    }
}

/// Wire shape handed back to the producer's hook:
/// `{ "permissionDecision": "allow"|"deny", "permissionDecisionReason": … }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub permission_decision: DecisionOutcome,
    pub permission_decision_reason: String,
}

/// How the approval wait ended.
enum WaitOutcome {
    Granted,
    Refused(ReceiptStatus),
    TimedOut,
    Cancelled,
}

/// The decision gateway. One instance serves many concurrent decisions.
pub struct DecisionGateway {
    config: GatewayConfig,
    control: Arc<dyn ControlPlane>,
    ledger: AuditLedger,
    cache: DecisionCache,
    workspace: Option<WorkspaceConfig>,
    event_sink: Option<Arc<dyn EventSink>>,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl DecisionGateway {
    pub fn new(config: GatewayConfig, control: Arc<dyn ControlPlane>) -> Self {
        let ledger = AuditLedger::new(config.audit_path());
        let cache = DecisionCache::load(config.cache_path());
        Self {
            config,
            control,
            ledger,
            cache,
            workspace: None,
            event_sink: None,
            notifiers: Vec::new(),
        }
    }

    /// Scope filesystem actions to an explicit workspace config.
    pub fn with_workspace(mut self, workspace: WorkspaceConfig) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Detect the workspace from a task's starting directory. Detection
    /// failure leaves the guard disabled (everything allowed).
    pub fn detect_workspace(mut self, start_dir: impl AsRef<std::path::Path>) -> Self {
        self.workspace = sc_workspace::detect(start_dir).map(|workspace| workspace.config);
        self
    }

    /// Attach a producer event sink.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Attach an out-of-band notifier (may be called multiple times).
    pub fn add_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// The audit ledger (read access for dashboards and tests).
    pub fn ledger(&self) -> &AuditLedger {
        &self.ledger
    }

    /// The offline decision cache.
    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    /// Decide one tool call. Infallible: every failure mode folds into a
    /// deny, and exactly one audit entry is written before returning.
    pub async fn decide(&self, tool_name: &str, tool_input: &Value, cancel: &CancelToken) -> Decision {
        let classification = classify(tool_name, tool_input);
        let envelope = classification.envelope;
        let signals = classification.risk_signals;

        tracing::debug!(
            tool = tool_name,
            action = %envelope.action_type,
            signals = signals.len(),
            "classified tool call"
        );

        // Workspace guard: filesystem reads and writes must stay in scope.
        // Runs before the safe-read shortcut so a scoped-out Read is still
        // denied locally.
        if self.workspace.is_some() && is_filesystem_action(&envelope.action_type) {
            if let Some(raw_path) = raw_file_path(tool_input) {
                if !sc_workspace::is_allowed(&raw_path, self.workspace.as_ref()) {
                    let reason = format!(
                        "Path '{}' is outside workspace scope",
                        sc_redact::sanitize(&raw_path)
                    );
                    self.audit(tool_name, &envelope, DecisionOutcome::Deny, DecisionSource::WorkspaceDeny, &signals, None);
                    return Decision::deny(reason);
                }
            }
        }

        // Local pre-filter: safe reads never leave the machine.
        if envelope.is_safe_read() {
            self.audit(tool_name, &envelope, DecisionOutcome::Allow, DecisionSource::LocalPrefilter, &signals, None);
            return Decision::allow("Local pre-filter: read-only action");
        }

        // Everything else needs the control plane.
        match self.control.evaluate(&envelope, cancel).await {
            Ok(response) => match response.outcome.clone() {
                RemoteOutcome::Allow => {
                    if self.config.cache_enabled {
                        if let Err(e) = self.cache.put(
                            &envelope.action_type,
                            &envelope.resource,
                            CachedOutcome::Allow,
                            self.config.cache_ttl,
                        ) {
                            tracing::debug!(error = %e, "cache write failed; decision unchanged");
                        }
                    }
                    let reason = response.reason.unwrap_or_else(|| "Approved by policy".to_string());
                    self.audit(
                        tool_name,
                        &envelope,
                        DecisionOutcome::Allow,
                        DecisionSource::Authensor,
                        &signals,
                        response.receipt_id.as_deref(),
                    );
                    Decision::allow(reason)
                }
                RemoteOutcome::Deny => {
                    let reason = response.reason.unwrap_or_else(|| "Denied by policy".to_string());
                    self.audit(
                        tool_name,
                        &envelope,
                        DecisionOutcome::Deny,
                        DecisionSource::Authensor,
                        &signals,
                        response.receipt_id.as_deref(),
                    );
                    Decision::deny(reason)
                }
                RemoteOutcome::RequireApproval => {
                    self.await_approval(tool_name, &envelope, &signals, response, cancel).await
                }
                RemoteOutcome::Unknown(raw) => {
                    // A verdict this build has never heard of is not a verdict.
                    self.audit(tool_name, &envelope, DecisionOutcome::Deny, DecisionSource::Authensor, &signals, None);
                    Decision::deny(format!("Unknown decision outcome '{raw}'"))
                }
            },
            Err(e) if e.is_cancelled() => {
                self.audit(tool_name, &envelope, DecisionOutcome::Deny, DecisionSource::FailClosed, &signals, None);
                Decision::deny("Hook aborted")
            }
            Err(e) => self.offline_fallback(tool_name, &envelope, &signals, &e),
        }
    }

    /// NETWORK_FAILURE: a cached positive decision may stand in; anything
    /// else is a fail-closed deny.
    fn offline_fallback(
        &self,
        tool_name: &str,
        envelope: &ActionEnvelope,
        signals: &[RiskSignal],
        error: &sc_control::ControlError,
    ) -> Decision {
        if self.config.cache_enabled {
            if let Some(CachedOutcome::Allow) =
                self.cache.get(&envelope.action_type, &envelope.resource)
            {
                tracing::info!(action = %envelope.action_type, "control plane unreachable; honoring cached allow");
                self.audit(tool_name, envelope, DecisionOutcome::Allow, DecisionSource::OfflineCache, signals, None);
                return Decision::allow("Approved from offline cache (control plane unreachable)");
            }
        }
        self.audit(tool_name, envelope, DecisionOutcome::Deny, DecisionSource::FailClosed, signals, None);
        Decision::deny(format!("Control plane unreachable (fail-closed): {error}"))
    }

    /// AWAITING_APPROVAL: poll the receipt until it resolves, the deadline
    /// passes, or the producer aborts.
    async fn await_approval(
        &self,
        tool_name: &str,
        envelope: &ActionEnvelope,
        signals: &[RiskSignal],
        response: EvaluateResponse,
        cancel: &CancelToken,
    ) -> Decision {
        let Some(receipt_id) = response.receipt_id else {
            // Cannot poll without a receipt; treat like an unknown verdict.
            self.audit(tool_name, envelope, DecisionOutcome::Deny, DecisionSource::Authensor, signals, None);
            return Decision::deny("Approval required but no receipt was issued");
        };

        self.emit(GatewayEvent::ApprovalRequired {
            receipt_id: receipt_id.clone(),
            action_type: envelope.action_type.clone(),
            resource: envelope.resource.clone(),
            risk_signals: signals.to_vec(),
        });

        let deadline = Instant::now() + self.config.approval_timeout;
        let wait_outcome = self.poll_receipt(&receipt_id, deadline, cancel).await;

        let decision = match wait_outcome {
            WaitOutcome::Granted => Decision::allow("Approved by human reviewer"),
            WaitOutcome::Refused(status) => {
                Decision::deny(format!("Approval {}", String::from(status)))
            }
            WaitOutcome::TimedOut => Decision::deny(format!(
                "Approval timeout after {}s",
                self.config.approval_timeout.as_secs()
            )),
            WaitOutcome::Cancelled => Decision::deny("Hook aborted"),
        };

        self.audit(tool_name, envelope, decision.outcome, DecisionSource::Authensor, signals, Some(&receipt_id));
        self.emit(GatewayEvent::ApprovalResolved {
            receipt_id,
            outcome: decision.outcome,
        });
        decision
    }

    /// The cooperative polling loop: sleep an interval, ask for the
    /// receipt, repeat. Transient poll errors are logged and the loop
    /// continues; only a terminal status, the deadline, or cancellation
    /// ends the wait.
    async fn poll_receipt(
        &self,
        receipt_id: &str,
        deadline: Instant,
        cancel: &CancelToken,
    ) -> WaitOutcome {
        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }

            let sleep_for = self.config.poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled,
                _ = tokio::time::sleep(sleep_for) => {}
            }
            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }

            match self.control.get_receipt(receipt_id, cancel).await {
                Ok(receipt) => {
                    if receipt.status.is_granted() {
                        return WaitOutcome::Granted;
                    }
                    if receipt.status.is_refused() {
                        return WaitOutcome::Refused(receipt.status);
                    }
                    // Pending (or unrecognized) — keep waiting.
                }
                Err(e) if e.is_cancelled() => return WaitOutcome::Cancelled,
                Err(e) => {
                    tracing::debug!(receipt = receipt_id, error = %e, "receipt poll failed; will retry");
                }
            }
        }
    }

    /// Append the terminal audit entry for this decision. Failures are
    /// swallowed: the attempt is required, persistence is best-effort.
    fn audit(
        &self,
        tool_name: &str,
        envelope: &ActionEnvelope,
        outcome: DecisionOutcome,
        source: DecisionSource,
        signals: &[RiskSignal],
        receipt_id: Option<&str>,
    ) {
        let mut entry = AuditEntry::new(
            tool_name,
            envelope.action_type.as_str(),
            envelope.resource.as_str(),
            outcome,
            source,
        )
        .with_profile(self.config.profile.as_str())
        .with_risk_signals(signals.to_vec());
        if let Some(task_id) = &self.config.task_id {
            entry = entry.with_task(task_id.as_str());
        }
        if let Some(receipt_id) = receipt_id {
            entry = entry.with_receipt(receipt_id);
        }

        if let Err(e) = self.ledger.append(&mut entry) {
            tracing::debug!(error = %e, "audit append failed; decision unchanged");
        }
        tracing::info!(
            tool = tool_name,
            action = %envelope.action_type,
            outcome = ?outcome,
            source = ?source,
            "decision recorded"
        );
    }

    /// Fan an event out to the sink (inline) and notifiers (spawned).
    fn emit(&self, event: GatewayEvent) {
        if let Some(sink) = &self.event_sink {
            sink.emit(&event);
        }
        for notifier in &self.notifiers {
            let notifier = Arc::clone(notifier);
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier.notify(event).await {
                    tracing::debug!(error = %e, "notifier delivery failed");
                }
            });
        }
    }
}

/// Actions whose resource is a filesystem path subject to the guard.
fn is_filesystem_action(action_type: &str) -> bool {
    action_type == "filesystem.write" || action_type == "safe.read.file"
}

/// The raw (unsanitized) path from the tool input, for the guard check.
fn raw_file_path(tool_input: &Value) -> Option<String> {
    let map = tool_input.as_object()?;
    for field in ["file_path", "notebook_path"] {
        if let Some(Value::String(path)) = map.get(field) {
            if !path.is_empty() {
                return Some(path.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filesystem_actions_are_guarded() {
        assert!(is_filesystem_action("filesystem.write"));
        assert!(is_filesystem_action("safe.read.file"));
        assert!(!is_filesystem_action("code.exec"));
        assert!(!is_filesystem_action("network.http"));
    }

    #[test]
    fn raw_file_path_prefers_file_path() {
        let input = json!({"file_path": "/a", "notebook_path": "/b"});
        assert_eq!(raw_file_path(&input).as_deref(), Some("/a"));
        let input = json!({"notebook_path": "/b"});
        assert_eq!(raw_file_path(&input).as_deref(), Some("/b"));
        assert_eq!(raw_file_path(&json!({"command": "ls"})), None);
        assert_eq!(raw_file_path(&Value::Null), None);
    }

    #[test]
    fn permission_response_uses_hook_field_names() {
        let decision = Decision::deny("outside workspace");
        let json = serde_json::to_string(&decision.to_permission_response()).unwrap();
        assert_eq!(
            json,
            r#"{"permissionDecision":"deny","permissionDecisionReason":"outside workspace"}"#
        );
    }
}
