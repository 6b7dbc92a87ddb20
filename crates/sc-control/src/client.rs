// client.rs — The control-plane HTTP client.
//
// One retry loop serves every operation: up to `max_retries` extra
// attempts on 429/5xx and transient transport failures, exponential
// backoff overridden by Retry-After, immediate bail-out on other 4xx, on
// cancellation, and on success. Callers on the decision path pass the
// decision's CancelToken so neither an in-flight request nor a backoff
// sleep outlives an aborted hook.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;

use sc_classify::ActionEnvelope;
use sc_policy::Policy;

use crate::cancel::CancelToken;
use crate::error::ControlError;
use crate::retry::{backoff, retry_after};
use crate::types::{
    EvaluateResponse, ProvisionDemo, Receipt, ReceiptStatus, ReceiptSummary,
};

/// Connection settings for the control plane.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    /// Base URL, e.g. `https://api.authensor.dev`.
    pub base_url: String,
    /// Bearer token attached to every request when present.
    pub token: Option<String>,
    /// Principal id sent as `principal.id` on evaluations.
    pub install_id: String,
    /// Per-attempt timeout.
    pub request_timeout: Duration,
    /// Extra attempts after the first, for retryable failures.
    pub max_retries: u32,
}

impl ControlPlaneConfig {
    pub fn new(base_url: impl Into<String>, install_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            install_id: install_id.into(),
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// The evaluate request body. This is the trust boundary: nothing beyond
/// the envelope, the principal, and a timestamp is ever attached.
#[derive(Serialize)]
struct EvaluateRequest<'a> {
    action: &'a ActionEnvelope,
    principal: Principal<'a>,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct Principal<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest {
    status: ReceiptStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivatePolicyRequest<'a> {
    policy_id: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionRequest<'a> {
    install_id: &'a str,
}

/// JSON-over-HTTPS client for the authensor control plane.
pub struct ControlPlaneClient {
    http: reqwest::Client,
    config: ControlPlaneConfig,
}

impl ControlPlaneClient {
    pub fn new(config: ControlPlaneConfig) -> Result<Self, ControlError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Readiness probe.
    pub async fn health(&self) -> Result<(), ControlError> {
        let url = self.url("health");
        self.execute(|| self.get(&url), None).await?;
        Ok(())
    }

    /// Ask the control plane to decide one envelope.
    pub async fn evaluate(
        &self,
        envelope: &ActionEnvelope,
        cancel: Option<&CancelToken>,
    ) -> Result<EvaluateResponse, ControlError> {
        let url = self.url("evaluate");
        let request = EvaluateRequest {
            action: envelope,
            principal: Principal {
                kind: "agent",
                id: &self.config.install_id,
            },
            timestamp: Utc::now(),
        };
        let response = self.execute(|| self.post(&url).json(&request), cancel).await?;
        Ok(response.json().await?)
    }

    /// Fetch the current state of an approval receipt.
    pub async fn get_receipt(
        &self,
        receipt_id: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<Receipt, ControlError> {
        let url = self.url(&format!("receipts/{receipt_id}"));
        let response = self.execute(|| self.get(&url), cancel).await?;
        Ok(response.json().await?)
    }

    /// List receipts awaiting approval.
    pub async fn list_pending(&self, limit: usize) -> Result<Vec<ReceiptSummary>, ControlError> {
        let url = self.url(&format!("receipts?status=pending&limit={limit}"));
        let response = self.execute(|| self.get(&url), None).await?;
        Ok(response.json().await?)
    }

    /// Resolve a receipt out-of-band (dashboard "approve"/"reject").
    pub async fn resolve_receipt(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
    ) -> Result<(), ControlError> {
        let url = self.url(&format!("receipts/{receipt_id}"));
        let body = ResolveRequest { status };
        self.execute(|| self.patch(&url).json(&body), None).await?;
        Ok(())
    }

    /// Upload a policy document.
    pub async fn create_policy(&self, policy: &Policy) -> Result<(), ControlError> {
        let url = self.url("policies");
        self.execute(|| self.post(&url).json(policy), None).await?;
        Ok(())
    }

    /// Select the active policy version for this install.
    pub async fn set_active_policy(&self, policy_id: &str, version: &str) -> Result<(), ControlError> {
        let url = self.url("policies/active");
        let body = ActivatePolicyRequest { policy_id, version };
        self.execute(|| self.post(&url).json(&body), None).await?;
        Ok(())
    }

    /// Provision demo credentials for a fresh install.
    ///
    /// A 404 means the deployment does not offer demo provisioning; that is
    /// a `None`, not an error, so callers can degrade gracefully.
    pub async fn provision_demo(
        &self,
        install_id: &str,
    ) -> Result<Option<ProvisionDemo>, ControlError> {
        let url = self.url("provision/demo");
        let body = ProvisionRequest { install_id };
        match self.execute(|| self.post(&url).json(&body), None).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(ControlError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn patch(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.patch(url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send with the retry policy. `build` constructs a fresh request per
    /// attempt; the cancellation token is observed before each attempt,
    /// during the request, and through every backoff sleep.
    async fn execute<F>(&self, build: F, cancel: Option<&CancelToken>) -> Result<Response, ControlError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(ControlError::Cancelled);
                }
            }

            let result = match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(ControlError::Cancelled),
                        result = build().send() => result,
                    }
                }
                None => build().send().await,
            };

            let delay = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !retryable {
                        let body = response.text().await.unwrap_or_default();
                        return Err(ControlError::Status { status, body });
                    }
                    if attempt > self.config.max_retries {
                        return Err(ControlError::RetryLimit(status));
                    }
                    let delay = retry_after(response.headers()).unwrap_or_else(|| backoff(attempt));
                    tracing::debug!(%status, attempt, delay_ms = delay.as_millis() as u64, "retrying control-plane call");
                    delay
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    if !transient || attempt > self.config.max_retries {
                        return Err(ControlError::Transport(e));
                    }
                    tracing::debug!(error = %e, attempt, "retrying control-plane call after transport error");
                    backoff(attempt)
                }
            };

            match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(ControlError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}
