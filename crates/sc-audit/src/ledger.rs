// ledger.rs — Append-only JSONL ledger with a previous-line hash chain.
//
// The only write operation is append; rotation renames the whole file.
// Multiple decisions can be in flight at once, so appends (and the cached
// last-hash they maintain) are serialized behind a mutex. The lock is never
// held across network I/O — everything under it is local file work.
//
// Each line's `prevHash` is the SHA-256 of the previous raw line text, or
// the literal "GENESIS" for the first chained line. Hashing the raw text
// means verification does not depend on JSON field ordering.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::entry::{AuditEntry, DecisionOutcome, GENESIS};
use crate::error::AuditError;
use crate::hasher;

/// Optional filters for [`AuditLedger::read`].
#[derive(Debug, Clone, Default)]
pub struct ReadFilter {
    /// Keep entries whose action type starts with this prefix.
    pub action_prefix: Option<String>,
    /// Keep entries with exactly this outcome.
    pub outcome: Option<DecisionOutcome>,
    /// Keep entries with exactly this tool name.
    pub tool_name: Option<String>,
}

/// The result of walking the chain forward.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// True iff no errors were found.
    pub valid: bool,
    /// Number of parseable entries in the file.
    pub total_entries: usize,
    /// Number of entries carrying a `prevHash`.
    pub chained_entries: usize,
    /// Per-line error descriptions (empty when valid).
    pub errors: Vec<String>,
}

/// Cached chain state; `None` means not yet recovered from disk.
struct ChainState {
    last_hash: Option<String>,
}

/// An append-only audit ledger backed by a JSONL file.
///
/// Cheap to construct: the file is opened per append, so a rename by
/// [`rotate`](AuditLedger::rotate) can never leave a stale handle writing
/// to the rotated-away file.
pub struct AuditLedger {
    path: PathBuf,
    state: Mutex<ChainState>,
}

impl AuditLedger {
    /// Create a ledger over the given path. The file itself is created on
    /// first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(ChainState { last_hash: None }),
        }
    }

    /// Path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, linking it to the previous line.
    ///
    /// Fills in `entry.prev_hash`, writes one compact JSON line plus a
    /// trailing newline in a single write, and updates the cached last
    /// hash. The file is created with owner-only permissions.
    pub fn append(&self, entry: &mut AuditEntry) -> Result<(), AuditError> {
        let mut state = self.lock_state();

        let prev = match &state.last_hash {
            Some(hash) => hash.clone(),
            None => Self::recover_last_hash(&self.path)?,
        };
        entry.prev_hash = Some(prev);

        let line = serde_json::to_string(entry)?;

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|source| AuditError::OpenFailed {
            path: self.path.clone(),
            source,
        })?;

        // Line + newline in one write so a concurrent reader never sees a
        // torn entry.
        file.write_all(format!("{line}\n").as_bytes())?;
        file.flush()?;

        state.last_hash = Some(hasher::hash_str(&line));
        Ok(())
    }

    /// Read entries newest-first, applying `filter`, up to `limit`.
    ///
    /// Malformed lines are skipped silently — reading is a display path,
    /// not an integrity check (that is [`verify`](AuditLedger::verify)).
    pub fn read(&self, limit: usize, filter: &ReadFilter) -> Result<Vec<AuditEntry>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| AuditError::OpenFailed {
            path: self.path.clone(),
            source,
        })?;

        let mut entries: Vec<AuditEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed audit line");
                    None
                }
            })
            .collect();
        entries.reverse();

        entries.retain(|entry| {
            if let Some(prefix) = &filter.action_prefix {
                if !entry.action_type.starts_with(prefix.as_str()) {
                    return false;
                }
            }
            if let Some(outcome) = filter.outcome {
                if entry.outcome != outcome {
                    return false;
                }
            }
            if let Some(tool) = &filter.tool_name {
                if entry.tool_name != *tool {
                    return false;
                }
            }
            true
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Read the newest `limit` entries with no filtering.
    pub fn tail(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        self.read(limit, &ReadFilter::default())
    }

    /// Rotate the ledger: rename the live file to `<path>.1` (replacing any
    /// prior rotation) and reset the chain to GENESIS.
    ///
    /// Holds the same lock as `append`, so rotation is exclusive with
    /// in-flight appends. Rotating a non-existent ledger is a no-op.
    pub fn rotate(&self) -> Result<(), AuditError> {
        let mut state = self.lock_state();

        if self.path.exists() {
            let rotated = PathBuf::from(format!("{}.1", self.path.display()));
            if rotated.exists() {
                fs::remove_file(&rotated).map_err(|source| AuditError::RotateFailed {
                    path: rotated.clone(),
                    source,
                })?;
            }
            fs::rename(&self.path, &rotated).map_err(|source| AuditError::RotateFailed {
                path: self.path.clone(),
                source,
            })?;
        }

        state.last_hash = Some(GENESIS.to_string());
        Ok(())
    }

    /// Walk the file forward and re-check every chain link.
    ///
    /// Legacy lines without `prevHash` are permitted: they contribute to
    /// the rolling expected hash but are not themselves verified. The first
    /// chained entry may also claim `GENESIS` when it follows legacy lines
    /// (the chain began mid-file). Malformed lines are verification errors.
    pub fn verify(&self) -> Result<VerifyReport, AuditError> {
        if !self.path.exists() {
            return Ok(VerifyReport {
                valid: true,
                total_entries: 0,
                chained_entries: 0,
                errors: Vec::new(),
            });
        }
        let content = fs::read_to_string(&self.path).map_err(|source| AuditError::OpenFailed {
            path: self.path.clone(),
            source,
        })?;

        let mut expected = GENESIS.to_string();
        let mut total_entries = 0;
        let mut chained_entries = 0;
        let mut errors = Vec::new();

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => {
                    total_entries += 1;
                    if let Some(prev_hash) = &entry.prev_hash {
                        chained_entries += 1;
                        let first_chained = chained_entries == 1;
                        let matches = *prev_hash == expected
                            || (first_chained && prev_hash.as_str() == GENESIS);
                        if !matches {
                            errors.push(format!(
                                "line {line_number}: prevHash mismatch (expected {expected}, found {prev_hash})"
                            ));
                        }
                    }
                }
                Err(e) => {
                    errors.push(format!("line {line_number}: malformed entry: {e}"));
                }
            }
            expected = hasher::hash_str(line);
        }

        Ok(VerifyReport {
            valid: errors.is_empty(),
            total_entries,
            chained_entries,
            errors,
        })
    }

    /// Recover the chain tail from an existing file: hash of the last
    /// non-empty line, or GENESIS for a missing/empty file.
    fn recover_last_hash(path: &Path) -> Result<String, AuditError> {
        if !path.exists() {
            return Ok(GENESIS.to_string());
        }
        let content = fs::read_to_string(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let last_line = content.lines().filter(|l| !l.trim().is_empty()).next_back();
        Ok(last_line.map_or_else(|| GENESIS.to_string(), hasher::hash_str))
    }

    /// Take the state lock, recovering from a poisoned mutex — a panicked
    /// appender leaves the file in a consistent state (whole lines only),
    /// so continuing with the cached hash is sound.
    fn lock_state(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
