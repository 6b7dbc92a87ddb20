// cache.rs — TTL-indexed map of positive decisions.
//
// Keyed by `actionType + "\0" + resource` (NUL cannot appear in either
// half, so the key is unambiguous). Values are always `allow` plus an
// absolute ms-since-epoch expiry. Expiry is lazy: entries are dropped when
// a lookup finds them stale, and pruned in bulk on cold start.
//
// Persistence is a whole-map JSON file replaced via temp-file + rename so
// a crash mid-write can never leave a half-written cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Outcome vocabulary accepted by [`DecisionCache::put`].
///
/// Only [`CachedOutcome::Allow`] is ever stored; passing any other value is
/// a no-op. The enum exists so callers hand the cache a typed verdict, not
/// a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedOutcome {
    Allow,
    Deny,
    RequireApproval,
}

/// One persisted cache slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    outcome: CachedOutcome,
    /// Absolute expiry, milliseconds since the Unix epoch.
    expires_at: i64,
}

/// The offline decision cache.
///
/// Interior-mutable: lookups and writes take `&self` and serialize on an
/// internal mutex, matching the gateway's concurrent-decision model.
pub struct DecisionCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl DecisionCache {
    /// Load the cache from disk, pruning expired entries.
    ///
    /// A missing or corrupt file yields an empty cache — corruption is
    /// logged and the file is overwritten by the next write.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut entries: HashMap<String, CacheEntry> = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt decision cache, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        let now = now_ms();
        entries.retain(|_, entry| entry.expires_at > now);

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Store a positive decision with the given time-to-live.
    ///
    /// Anything other than `Allow` is a no-op: denials must never be
    /// replayable from disk.
    pub fn put(
        &self,
        action_type: &str,
        resource: &str,
        outcome: CachedOutcome,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if outcome != CachedOutcome::Allow {
            return Ok(());
        }
        let entry = CacheEntry {
            outcome: CachedOutcome::Allow,
            expires_at: now_ms() + ttl.as_millis() as i64,
        };
        let snapshot = {
            let mut entries = self.lock_entries();
            entries.insert(cache_key(action_type, resource), entry);
            entries.clone()
        };
        self.persist(&snapshot)
    }

    /// Look up a cached decision, lazily expiring stale entries.
    pub fn get(&self, action_type: &str, resource: &str) -> Option<CachedOutcome> {
        let key = cache_key(action_type, resource);
        let mut entries = self.lock_entries();
        match entries.get(&key) {
            Some(entry) if entry.expires_at > now_ms() => Some(entry.outcome),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Drop every entry and persist the empty map.
    pub fn clear(&self) -> Result<(), CacheError> {
        let snapshot = {
            let mut entries = self.lock_entries();
            entries.clear();
            entries.clone()
        };
        self.persist(&snapshot)
    }

    /// Number of live entries (expired-but-unpruned entries count until
    /// something looks them up).
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically replace the on-disk map: write `<path>.tmp` owner-only,
    /// then rename over the live file.
    fn persist(&self, entries: &HashMap<String, CacheEntry>) -> Result<(), CacheError> {
        let json = serde_json::to_string(entries)?;
        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));

        fs::write(&tmp, json).map_err(|source| CacheError::PersistFailed {
            path: tmp.clone(),
            source,
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600));
        }
        fs::rename(&tmp, &self.path).map_err(|source| CacheError::PersistFailed {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The composite cache key. NUL is the separator because it can appear in
/// neither an action type nor a sanitized resource.
fn cache_key(action_type: &str, resource: &str) -> String {
    format!("{action_type}\u{0}{resource}")
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
