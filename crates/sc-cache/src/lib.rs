//! # sc-cache
//!
//! Offline decision cache for SafeClaw.
//!
//! When the control plane is unreachable, the gateway may fall back to a
//! previously granted `allow` for the identical envelope instead of failing
//! closed. Only positive decisions are ever stored, so a denial can never
//! be replayed from disk, and every entry carries an absolute expiry.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sc_cache::{CachedOutcome, DecisionCache};
//!
//! let cache = DecisionCache::load("/tmp/decision-cache.json");
//! cache.put("code.exec", "cargo test", CachedOutcome::Allow, Duration::from_secs(3600)).unwrap();
//! assert_eq!(cache.get("code.exec", "cargo test"), Some(CachedOutcome::Allow));
//! ```

pub mod cache;
pub mod error;

pub use cache::{CachedOutcome, DecisionCache};
pub use error::CacheError;
