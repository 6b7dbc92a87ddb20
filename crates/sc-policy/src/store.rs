// store.rs — Versioned persistence for policy documents.
//
// The live document sits at `<path>`; every save first copies the prior
// file to `<path>.v<N>` (N = the prior document's embedded version integer)
// and writes the new document with version v<N+1>. Backups accumulate until
// the user deletes them — the store never garbage-collects, so the full
// edit history stays inspectable and `rollback` always has something to
// restore.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::{extract_version_number, Policy};
use crate::error::PolicyError;

/// Summary of one backed-up policy version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub version: u32,
    /// Backup file modification time.
    pub saved_at: DateTime<Utc>,
    pub rule_count: usize,
    pub name: String,
}

/// Store for one profile's policy document and its version history.
pub struct PolicyStore {
    path: PathBuf,
}

impl PolicyStore {
    /// Create a store over the live policy path (e.g.
    /// `~/.safeclaw/policies/default.json`). Parent directories are created
    /// on first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the live policy file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the live document. Missing or malformed files are errors — a
    /// policy that cannot be read must never silently become "no policy".
    pub fn load(&self) -> Result<Policy, PolicyError> {
        Self::load_file(&self.path)
    }

    /// Save a document, backing up the prior file and bumping the version.
    ///
    /// Returns the document as written (its version field rewritten to
    /// v<N+1>). A corrupt *prior* file is treated as if there were no prior
    /// version: no backup is created and the new document starts at v1.
    pub fn save(&self, policy: &Policy) -> Result<Policy, PolicyError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PolicyError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let prior = match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<Policy>(&raw) {
                Ok(parsed) => Some((raw, parsed.version_number())),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "prior policy file is corrupt; saving without a backup"
                    );
                    None
                }
            },
            Err(_) => None,
        };

        let next_version = prior.as_ref().map_or(1, |(_, n)| n + 1);

        if let Some((raw, version)) = prior {
            let backup = self.version_path(version);
            write_owner_only(&backup, &raw)?;
        }

        let mut saved = policy.clone();
        saved.version = format!("v{next_version}");
        let json = serde_json::to_string_pretty(&saved)?;
        self.write_atomic(&json)?;
        Ok(saved)
    }

    /// List backed-up versions, newest first.
    ///
    /// Only filenames exactly matching `<base>.v<integer>` count; backup
    /// files that no longer parse are skipped.
    pub fn list_versions(&self) -> Result<Vec<VersionSummary>, PolicyError> {
        let parent = match self.path.parent() {
            Some(parent) if parent.exists() => parent,
            _ => return Ok(Vec::new()),
        };
        let base = format!(
            "{}.v",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );

        let entries = fs::read_dir(parent).map_err(|source| PolicyError::Io {
            path: parent.to_path_buf(),
            source,
        })?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PolicyError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(suffix) = file_name.strip_prefix(&base) else {
                continue;
            };
            let Ok(version) = suffix.parse::<u32>() else {
                continue;
            };

            let path = entry.path();
            let policy = match Self::load_file(&path) {
                Ok(policy) => policy,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable policy backup");
                    continue;
                }
            };
            let saved_at = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            versions.push(VersionSummary {
                version,
                saved_at,
                rule_count: policy.rules.len(),
                name: policy.name,
            });
        }

        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    /// Load a specific backed-up version.
    pub fn load_version(&self, version: u32) -> Result<Policy, PolicyError> {
        let path = self.version_path(version);
        if !path.exists() {
            return Err(PolicyError::VersionNotFound {
                path: self.path.clone(),
                version,
            });
        }
        Self::load_file(&path)
    }

    /// Restore a backed-up version by re-saving it through the normal save
    /// path — the restored content becomes a *new* forward version, and the
    /// document it replaced is itself backed up first.
    pub fn rollback(&self, version: u32) -> Result<Policy, PolicyError> {
        let restored = self.load_version(version)?;
        self.save(&restored)
    }

    fn load_file(path: &Path) -> Result<Policy, PolicyError> {
        let raw = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| PolicyError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn version_path(&self, version: u32) -> PathBuf {
        PathBuf::from(format!("{}.v{version}", self.path.display()))
    }

    /// Replace the live file via temp-file + rename, owner-only.
    fn write_atomic(&self, content: &str) -> Result<(), PolicyError> {
        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        write_owner_only(&tmp, content)?;
        fs::rename(&tmp, &self.path).map_err(|source| PolicyError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

fn write_owner_only(path: &Path, content: &str) -> Result<(), PolicyError> {
    fs::write(path, content).map_err(|source| PolicyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Condition, Effect, Field, Operator, Predicate, PredicateValue, Rule};
    use tempfile::tempdir;

    fn sample_policy(name: &str, rule_count: usize) -> Policy {
        let rules = (0..rule_count)
            .map(|i| {
                Rule::new(
                    format!("rule-{i}"),
                    Effect::Allow,
                    Condition::Single(Predicate {
                        field: Field::ActionType,
                        operator: Operator::StartsWith,
                        value: PredicateValue::One("safe.read.".into()),
                    }),
                )
            })
            .collect();
        Policy {
            id: "pol-1".into(),
            name: name.into(),
            version: "v0".into(),
            default_effect: Effect::Deny,
            rules,
        }
    }

    #[test]
    fn first_save_writes_v1_with_no_backup() {
        let dir = tempdir().unwrap();
        let store = PolicyStore::new(dir.path().join("default.json"));

        let saved = store.save(&sample_policy("fresh", 1)).unwrap();
        assert_eq!(saved.version, "v1");
        assert!(store.list_versions().unwrap().is_empty());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.version, "v1");
        assert_eq!(loaded.name, "fresh");
    }

    #[test]
    fn save_backs_up_prior_and_bumps_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.json");
        let store = PolicyStore::new(&path);

        store.save(&sample_policy("one", 1)).unwrap();
        let saved = store.save(&sample_policy("two", 2)).unwrap();
        assert_eq!(saved.version, "v2");

        // The pre-save version (v1) is now a backup.
        let versions = store.list_versions().unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].name, "one");
        assert_eq!(versions[0].rule_count, 1);
        assert!(dir.path().join("default.json.v1").exists());
    }

    #[test]
    fn versions_accumulate_and_list_newest_first() {
        let dir = tempdir().unwrap();
        let store = PolicyStore::new(dir.path().join("default.json"));

        for i in 0..4 {
            store.save(&sample_policy(&format!("gen-{i}"), i)).unwrap();
        }

        let versions = store.list_versions().unwrap();
        let numbers: Vec<u32> = versions.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn load_version_and_rollback_create_forward_history() {
        let dir = tempdir().unwrap();
        let store = PolicyStore::new(dir.path().join("default.json"));

        store.save(&sample_policy("first", 1)).unwrap();
        store.save(&sample_policy("second", 2)).unwrap();

        let v1 = store.load_version(1).unwrap();
        assert_eq!(v1.name, "first");

        // Rolling back to v1 re-saves it as v3; v2 is backed up in passing.
        let restored = store.rollback(1).unwrap();
        assert_eq!(restored.version, "v3");
        assert_eq!(restored.name, "first");
        assert_eq!(store.load().unwrap().name, "first");

        let versions = store.list_versions().unwrap();
        let numbers: Vec<u32> = versions.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![2, 1]);
    }

    #[test]
    fn rollback_to_missing_version_errors() {
        let dir = tempdir().unwrap();
        let store = PolicyStore::new(dir.path().join("default.json"));
        store.save(&sample_policy("only", 1)).unwrap();

        match store.rollback(9) {
            Err(PolicyError::VersionNotFound { version: 9, .. }) => {}
            other => panic!("expected VersionNotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = PolicyStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(PolicyError::Io { .. })));
    }

    #[test]
    fn load_corrupt_file_raises_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.json");
        fs::write(&path, "not a policy").unwrap();

        let store = PolicyStore::new(&path);
        assert!(matches!(store.load(), Err(PolicyError::Parse { .. })));
    }

    #[test]
    fn corrupt_prior_is_replaced_without_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.json");
        fs::write(&path, "{{ garbage").unwrap();

        let store = PolicyStore::new(&path);
        let saved = store.save(&sample_policy("clean", 1)).unwrap();
        assert_eq!(saved.version, "v1");
        assert!(store.list_versions().unwrap().is_empty());
        assert_eq!(store.load().unwrap().name, "clean");
    }

    #[test]
    fn version_bump_follows_prior_file_not_input_document() {
        let dir = tempdir().unwrap();
        let store = PolicyStore::new(dir.path().join("default.json"));

        store.save(&sample_policy("a", 1)).unwrap();
        store.save(&sample_policy("b", 1)).unwrap();
        store.save(&sample_policy("c", 1)).unwrap();

        // Incoming documents all claimed "v0"; the store still counts up.
        let mut incoming = sample_policy("d", 1);
        incoming.version = "v999-draft".into();
        // A draft label with an embedded integer does not reset history —
        // the bump is driven by the on-disk document.
        let saved = store.save(&incoming).unwrap();
        assert_eq!(saved.version, "v4");
    }

    #[test]
    fn unrelated_files_are_not_versions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.json");
        let store = PolicyStore::new(&path);
        store.save(&sample_policy("a", 1)).unwrap();

        // Files that do not match `<base>.v<integer>` exactly are ignored.
        fs::write(dir.path().join("default.json.v1x"), "junk").unwrap();
        fs::write(dir.path().join("default.json.bak"), "junk").unwrap();
        fs::write(dir.path().join("other.json.v7"), "junk").unwrap();

        assert!(store.list_versions().unwrap().is_empty());
    }
}
