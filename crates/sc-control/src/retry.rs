// retry.rs — Backoff schedule for retryable control-plane failures.
//
// Exponential starting at 1s and doubling per attempt (1s → 2s → 4s),
// with ±20% jitter so a fleet of stalled decisions does not thunder back
// in lockstep. A `Retry-After` header, when the server sends one,
// overrides the computed delay.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Delay before retry number `attempt` (1-based), with jitter.
pub(crate) fn backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let base_ms = 1_000u64 << exponent;
    let jitter = rand::thread_rng().gen_range(0.8..1.2);
    Duration::from_millis((base_ms as f64 * jitter) as u64)
}

/// Parse a `Retry-After: <seconds>` header, if present and numeric.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn backoff_doubles_with_jitter_bounds() {
        for (attempt, base_ms) in [(1u32, 1_000u64), (2, 2_000), (3, 4_000)] {
            let delay = backoff(attempt).as_millis() as u64;
            assert!(delay >= base_ms * 8 / 10, "attempt {attempt}: {delay}ms");
            assert!(delay <= base_ms * 12 / 10 + 1, "attempt {attempt}: {delay}ms");
        }
    }

    #[test]
    fn backoff_exponent_is_capped() {
        // Far-out attempts must not overflow the shift.
        let delay = backoff(40);
        assert!(delay <= Duration::from_millis(64_000 * 12 / 10 + 1));
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn retry_after_ignores_absent_or_non_numeric() {
        assert_eq!(retry_after(&HeaderMap::new()), None);
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 01 Jan 2026 00:00:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }
}
