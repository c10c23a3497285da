//! Retry backoff policy.

use chrono::Duration;

/// Exponential backoff for the given attempt number (1-based), capped.
///
/// Attempt 1 waits `base`, attempt 2 waits `2 * base`, doubling until `cap`.
/// Attempts past the cap keep retrying at `cap` — messages are never dropped
/// or dead-lettered automatically; stuck ones surface through the outbox
/// health stats instead.
#[must_use]
pub fn exponential(base: Duration, cap: Duration, attempt: i32) -> Duration {
    let exponent = attempt.clamp(1, 30) - 1;
    let factor = 1_i64 << exponent;
    base.checked_mul(i32::try_from(factor).unwrap_or(i32::MAX))
        .map_or(cap, |d| d.min(cap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::seconds(2);
        let cap = Duration::minutes(5);
        assert_eq!(exponential(base, cap, 1), Duration::seconds(2));
        assert_eq!(exponential(base, cap, 2), Duration::seconds(4));
        assert_eq!(exponential(base, cap, 3), Duration::seconds(8));
        assert_eq!(exponential(base, cap, 5), Duration::seconds(32));
    }

    #[test]
    fn test_backoff_is_capped() {
        let base = Duration::seconds(2);
        let cap = Duration::minutes(5);
        assert_eq!(exponential(base, cap, 10), cap);
        assert_eq!(exponential(base, cap, 30), cap);
        assert_eq!(exponential(base, cap, i32::MAX), cap);
    }

    #[test]
    fn test_degenerate_attempt_counts_behave() {
        let base = Duration::seconds(2);
        let cap = Duration::minutes(5);
        assert_eq!(exponential(base, cap, 0), base);
        assert_eq!(exponential(base, cap, -3), base);
    }
}
