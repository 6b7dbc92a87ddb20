// config.rs — Workspace scope configuration.
//
// A `.safeclaw.json` in the project root declares which absolute paths the
// agent may touch and which are off-limits. `~` in either list expands to
// the home directory. Without a file, the default scope allows the root
// subtree and denies the usual home-directory credential locations.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// Home-relative directories denied by the synthesized default config.
const DEFAULT_DENIED: &[&str] = &[
    "~/.ssh",
    "~/.aws",
    "~/.gnupg",
    "~/.kube",
    "~/.docker",
    "~/.config/gcloud",
];

/// On-disk shape of `.safeclaw.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceFile {
    #[serde(default)]
    allowed_paths: Vec<String>,
    #[serde(default)]
    denied_paths: Vec<String>,
}

/// Resolved workspace scope: absolute, normalized path sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
    pub allowed_paths: Vec<PathBuf>,
    pub denied_paths: Vec<PathBuf>,
}

impl WorkspaceConfig {
    /// The synthesized default for a root with no `.safeclaw.json`.
    pub fn default_for_root(root: impl AsRef<Path>) -> Self {
        let root = normalize(root.as_ref());
        Self {
            allowed_paths: vec![root.clone()],
            denied_paths: DEFAULT_DENIED.iter().map(|p| normalize(&expand_home(p))).collect(),
            root,
        }
    }

    /// Parse a `.safeclaw.json`. Returns `None` when the file is missing
    /// or malformed — the caller decides what to fall back to.
    pub fn from_file(path: &Path, root: impl AsRef<Path>) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        let file: WorkspaceFile = match serde_json::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed workspace config");
                return None;
            }
        };

        let root = normalize(root.as_ref());
        let mut allowed_paths: Vec<PathBuf> = file
            .allowed_paths
            .iter()
            .map(|p| normalize(&expand_home(p)))
            .collect();
        // A config that names no allowed paths still scopes to its root.
        if allowed_paths.is_empty() {
            allowed_paths.push(root.clone());
        }
        let denied_paths = file
            .denied_paths
            .iter()
            .map(|p| normalize(&expand_home(p)))
            .collect();

        Some(Self {
            root,
            allowed_paths,
            denied_paths,
        })
    }
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Lexically normalize a path: make it absolute (against the current
/// directory), drop `.` components, and resolve `..` without touching the
/// filesystem — the target of a pending write may not exist yet.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut parts: Vec<std::ffi::OsString> = Vec::new();
    let mut prefix = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(p) => prefix.push(p.as_os_str()),
            Component::RootDir => {}
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part.to_os_string()),
        }
    }

    let mut result = prefix;
    result.push(std::path::MAIN_SEPARATOR.to_string());
    for part in parts {
        result.push(part);
    }
    result
}
