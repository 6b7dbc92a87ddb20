// config.rs — Gateway configuration and state layout.
//
// All persisted state lives under one per-user directory (`~/.safeclaw/`):
// the audit ledger, the offline decision cache, and per-profile policy
// documents. Tests point `state_dir` at a temp directory instead.

use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

/// Configuration for one gateway instance.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Active policy profile name (selects `policies/<profile>.json`).
    pub profile: String,

    /// Principal id sent to the control plane; minted once per install.
    pub install_id: String,

    /// Root directory for persisted state.
    pub state_dir: PathBuf,

    /// Whether positive decisions are cached for offline fallback.
    pub cache_enabled: bool,

    /// Time-to-live for cached positive decisions.
    pub cache_ttl: Duration,

    /// Overall deadline for a human approval, from entering the wait.
    pub approval_timeout: Duration,

    /// Sleep between receipt polls.
    pub poll_interval: Duration,

    /// Producer-supplied task correlation id stamped onto audit entries.
    pub task_id: Option<String>,
}

impl GatewayConfig {
    /// Standard configuration for a profile, with state under
    /// `~/.safeclaw/` and a freshly minted install id.
    pub fn for_profile(profile: impl Into<String>) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            profile: profile.into(),
            install_id: Uuid::new_v4().to_string(),
            state_dir: home.join(".safeclaw"),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
            approval_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(3),
            task_id: None,
        }
    }

    /// Path of the audit ledger.
    pub fn audit_path(&self) -> PathBuf {
        self.state_dir.join("audit.jsonl")
    }

    /// Path of the offline decision cache.
    pub fn cache_path(&self) -> PathBuf {
        self.state_dir.join("decision-cache.json")
    }

    /// Path of this profile's live policy document.
    pub fn policy_path(&self) -> PathBuf {
        self.state_dir
            .join("policies")
            .join(format!("{}.json", self.profile))
    }
}
