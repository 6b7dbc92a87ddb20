// guard.rs — Project-root detection and path scoping.
//
// Detection walks upward from the task's starting directory, at most ten
// parent hops, and stops at the first directory holding a workspace
// marker. Marker priority within a directory: `.safeclaw.json` (explicit
// scope) beats `.git` beats `package.json` — the latter two only identify
// the root and get the synthesized default scope.

use std::path::{Path, PathBuf};

use crate::config::{normalize, WorkspaceConfig};

/// Maximum number of parent hops during detection.
const MAX_PARENT_HOPS: usize = 10;

/// Root markers in priority order.
const MARKERS: &[&str] = &[".safeclaw.json", ".git", "package.json"];

/// A detected workspace: the root directory and its resolved scope.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: WorkspaceConfig,
}

/// Walk upward from `start_dir` looking for a workspace root.
///
/// Returns `None` when no marker is found within the hop budget — which
/// the gateway treats as "no guard".
pub fn detect(start_dir: impl AsRef<Path>) -> Option<Workspace> {
    let mut dir = normalize(start_dir.as_ref());

    for _ in 0..=MAX_PARENT_HOPS {
        if MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            let config_path = dir.join(".safeclaw.json");
            let config = if config_path.exists() {
                // Malformed files fall back to the default scope for this root.
                WorkspaceConfig::from_file(&config_path, &dir)
                    .unwrap_or_else(|| WorkspaceConfig::default_for_root(&dir))
            } else {
                WorkspaceConfig::default_for_root(&dir)
            };
            return Some(Workspace { root: dir, config });
        }
        if !dir.pop() {
            return None;
        }
    }
    None
}

/// Decide whether `path` falls inside the allowed scope.
///
/// Denied paths win over allowed paths; anything matching neither list is
/// outside the scope. With no config at all the guard is a no-op and
/// everything is allowed.
pub fn is_allowed(path: impl AsRef<Path>, config: Option<&WorkspaceConfig>) -> bool {
    let Some(config) = config else {
        return true;
    };
    let resolved = normalize(path.as_ref());

    if config.denied_paths.iter().any(|denied| resolved.starts_with(denied)) {
        return false;
    }
    config.allowed_paths.iter().any(|allowed| resolved.starts_with(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config(allowed: &[&str], denied: &[&str]) -> WorkspaceConfig {
        WorkspaceConfig {
            root: PathBuf::from(allowed.first().copied().unwrap_or("/")),
            allowed_paths: allowed.iter().map(PathBuf::from).collect(),
            denied_paths: denied.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn no_config_allows_everything() {
        assert!(is_allowed("/anywhere/at/all", None));
        assert!(is_allowed("/etc/passwd", None));
    }

    #[test]
    fn paths_inside_allowed_scope_pass() {
        let cfg = config(&["/project"], &[]);
        assert!(is_allowed("/project", Some(&cfg)));
        assert!(is_allowed("/project/src/main.rs", Some(&cfg)));
        assert!(!is_allowed("/other/place", Some(&cfg)));
    }

    #[test]
    fn denied_wins_over_allowed() {
        // The same path matches both lists; deny takes precedence.
        let cfg = config(&["/home/u"], &["/home/u/.ssh"]);
        assert!(is_allowed("/home/u/code/x.rs", Some(&cfg)));
        assert!(!is_allowed("/home/u/.ssh/id_rsa", Some(&cfg)));
        assert!(!is_allowed("/home/u/.ssh", Some(&cfg)));
    }

    #[test]
    fn prefix_match_is_component_wise() {
        // "/project-evil" is not inside "/project".
        let cfg = config(&["/project"], &[]);
        assert!(!is_allowed("/project-evil/x", Some(&cfg)));
    }

    #[test]
    fn traversal_cannot_escape_scope() {
        let cfg = config(&["/project"], &[]);
        assert!(!is_allowed("/project/../etc/passwd", Some(&cfg)));
        assert!(is_allowed("/project/sub/../file.txt", Some(&cfg)));
    }

    #[test]
    fn unmatched_paths_are_outside() {
        let cfg = config(&["/project"], &["/project/secrets"]);
        assert!(!is_allowed("/var/tmp/x", Some(&cfg)));
    }

    #[test]
    fn detect_finds_git_root_upward() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("repo");
        let nested = root.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        let workspace = detect(&nested).unwrap();
        assert_eq!(workspace.root, normalize(&root));
        // No .safeclaw.json: default scope allows the root subtree.
        assert!(is_allowed(root.join("src/lib.rs"), Some(&workspace.config)));
    }

    #[test]
    fn detect_prefers_nearest_marker_directory() {
        // .git at the outer level, package.json nearer: the nearest
        // marker-bearing directory wins, whatever its marker.
        let dir = tempdir().unwrap();
        let outer = dir.path().join("outer");
        let inner = outer.join("app");
        fs::create_dir_all(inner.join("src")).unwrap();
        fs::create_dir_all(outer.join(".git")).unwrap();
        fs::write(inner.join("package.json"), "{}").unwrap();

        let workspace = detect(inner.join("src")).unwrap();
        assert_eq!(workspace.root, normalize(&inner));
    }

    #[test]
    fn detect_reads_safeclaw_config() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        fs::write(
            root.join(".safeclaw.json"),
            format!(
                r#"{{ "allowedPaths": ["{}"], "deniedPaths": ["{}"] }}"#,
                root.display(),
                root.join("vault").display()
            ),
        )
        .unwrap();

        let workspace = detect(&root).unwrap();
        assert!(is_allowed(root.join("ok.txt"), Some(&workspace.config)));
        assert!(!is_allowed(root.join("vault/key"), Some(&workspace.config)));
    }

    #[test]
    fn detect_falls_back_on_malformed_config() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(".safeclaw.json"), "not json at all").unwrap();

        let workspace = detect(&root).unwrap();
        // Default scope for the root still applies.
        assert_eq!(workspace.config.allowed_paths, vec![normalize(&root)]);
        assert!(is_allowed(root.join("x"), Some(&workspace.config)));
    }

    #[test]
    fn detect_gives_up_after_hop_budget() {
        let dir = tempdir().unwrap();
        let mut deep = dir.path().join("m");
        for i in 0..14 {
            deep = deep.join(format!("d{i}"));
        }
        fs::create_dir_all(&deep).unwrap();
        fs::create_dir_all(dir.path().join("m").join(".git")).unwrap();

        // The marker is more than ten hops above the starting directory.
        assert!(detect(&deep).is_none());
    }

    #[test]
    fn detect_without_any_marker_finds_nothing_in_tree() {
        let dir = tempdir().unwrap();
        let lonely = dir.path().join("no/markers/here");
        fs::create_dir_all(&lonely).unwrap();
        // The walk may leave the tempdir and hit an ancestor marker on the
        // host, but nothing inside the markerless tree can be a root.
        let result = detect(&lonely);
        assert!(result.map_or(true, |ws| !ws.root.starts_with(dir.path())));
    }
}
