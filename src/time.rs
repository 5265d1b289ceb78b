//! Clock and TTL helpers.
//!
//! TTL markers are absolute Unix timestamps in milliseconds. The write path
//! stamps them and the eviction janitor checks them through the same [`Clock`],
//! so "set" and "check" never disagree about what "now" is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Sentinel TTL meaning "never expires".
pub const NO_EXPIRY: u64 = 0;

/// A source of "now" in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// Used by tests to expire keys deterministically without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Returns true if `ttl` is set and is not later than `now`.
#[inline]
pub fn is_expired(ttl: u64, now: u64) -> bool {
    ttl != NO_EXPIRY && ttl <= now
}

/// Converts a relative TTL into an absolute marker on `clock`.
///
/// `None` yields [`NO_EXPIRY`]. A zero duration is clamped to one millisecond
/// so it cannot collide with the sentinel.
#[inline]
pub fn expiry_from_ttl(clock: &dyn Clock, ttl: Option<Duration>) -> u64 {
    match ttl {
        None => NO_EXPIRY,
        Some(d) => clock
            .now_ms()
            .saturating_add((d.as_millis() as u64).max(1)),
    }
}

/// Returns the remaining TTL in milliseconds, or None if the entry never expires.
#[inline]
pub fn remaining_ms(ttl: u64, now: u64) -> Option<u64> {
    if ttl == NO_EXPIRY {
        None
    } else {
        Some(ttl.saturating_sub(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_never_expires() {
        assert!(!is_expired(NO_EXPIRY, 0));
        assert!(!is_expired(NO_EXPIRY, u64::MAX));
    }

    #[test]
    fn test_expired_iff_ttl_not_after_now() {
        assert!(!is_expired(1_000, 999));
        assert!(is_expired(1_000, 1_000));
        assert!(is_expired(1_000, 1_001));
        assert!(is_expired(1, u64::MAX));
    }

    #[test]
    fn test_predicate_matches_definition_over_grid() {
        for ttl in [NO_EXPIRY, 1, 50, 100, 10_000] {
            for now in [0, 1, 49, 50, 51, 100, 20_000] {
                let expected = ttl != NO_EXPIRY && ttl <= now;
                assert_eq!(is_expired(ttl, now), expected, "ttl={ttl} now={now}");
            }
        }
    }

    #[test]
    fn test_expiry_from_ttl_uses_clock() {
        let clock = ManualClock::new(5_000);
        assert_eq!(expiry_from_ttl(&clock, None), NO_EXPIRY);
        assert_eq!(
            expiry_from_ttl(&clock, Some(Duration::from_millis(250))),
            5_250
        );
        assert_eq!(expiry_from_ttl(&clock, Some(Duration::ZERO)), 5_001);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(10);
        clock.advance(Duration::from_millis(15));
        assert_eq!(clock.now_ms(), 25);
        clock.set(3);
        assert_eq!(clock.now_ms(), 3);
    }

    #[test]
    fn test_remaining_ms_saturates() {
        assert_eq!(remaining_ms(NO_EXPIRY, 10), None);
        assert_eq!(remaining_ms(100, 40), Some(60));
        assert_eq!(remaining_ms(100, 400), Some(0));
    }

    #[test]
    fn test_system_clock_is_past_epoch() {
        assert!(SystemClock.now_ms() > 1_600_000_000_000);
    }
}
