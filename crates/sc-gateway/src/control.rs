// control.rs — The gateway's view of the control plane.
//
// The gateway needs exactly two remote operations; narrowing the full
// client to this trait keeps the decision path testable with in-memory
// fakes and keeps the real client swappable.

use async_trait::async_trait;

use sc_classify::ActionEnvelope;
use sc_control::{CancelToken, ControlError, ControlPlaneClient, EvaluateResponse, Receipt};

/// What the decision path requires from the control plane.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Ask for a verdict on one envelope.
    async fn evaluate(
        &self,
        envelope: &ActionEnvelope,
        cancel: &CancelToken,
    ) -> Result<EvaluateResponse, ControlError>;

    /// Poll the state of an approval receipt.
    async fn get_receipt(
        &self,
        receipt_id: &str,
        cancel: &CancelToken,
    ) -> Result<Receipt, ControlError>;
}

#[async_trait]
impl ControlPlane for ControlPlaneClient {
    async fn evaluate(
        &self,
        envelope: &ActionEnvelope,
        cancel: &CancelToken,
    ) -> Result<EvaluateResponse, ControlError> {
        ControlPlaneClient::evaluate(self, envelope, Some(cancel)).await
    }

    async fn get_receipt(
        &self,
        receipt_id: &str,
        cancel: &CancelToken,
    ) -> Result<Receipt, ControlError> {
        ControlPlaneClient::get_receipt(self, receipt_id, Some(cancel)).await
    }
}
