//! In-process rate limiting for login attempts.
//!
//! Lockout is a sliding window measured from the most recent failure, not the
//! first: every failed attempt pushes the window forward. State lives in
//! process memory and resets on restart, which is an accepted trade-off for a
//! single-instance deployment. The trait seam exists so a shared store (e.g.
//! a TTL cache) can replace the map without touching call sites.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_WINDOW: Duration = Duration::from_secs(300);

pub trait LoginRateLimiter: Send + Sync {
    /// Record a failed login attempt for an identifier.
    fn record_failure(&self, identifier: &str);
    /// True while the identifier has reached the attempt limit within the window.
    fn is_locked(&self, identifier: &str) -> bool;
    /// Seconds until the lockout expires; 0 when not locked.
    fn remaining_lockout_seconds(&self, identifier: &str) -> u64;
    /// Forget the identifier entirely (called on successful login).
    fn clear(&self, identifier: &str);
}

#[derive(Clone, Copy, Debug)]
struct AttemptWindow {
    failures: u32,
    last_failure: Instant,
}

/// Mutex-guarded map of failed-attempt counters keyed by login identifier.
#[derive(Debug)]
pub struct InMemoryLoginLimiter {
    entries: Mutex<HashMap<String, AttemptWindow>>,
    max_attempts: u32,
    lockout_window: Duration,
}

impl InMemoryLoginLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_WINDOW)
    }

    #[must_use]
    pub fn with_limits(max_attempts: u32, lockout_window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
            lockout_window,
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, AttemptWindow>> {
        // A poisoned map only means another thread panicked mid-update; the
        // counters are still usable.
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryLoginLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter for InMemoryLoginLimiter {
    fn record_failure(&self, identifier: &str) {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        match entries.get_mut(identifier) {
            Some(entry) if now.duration_since(entry.last_failure) > self.lockout_window => {
                // Stale window: start counting again from this failure.
                entry.failures = 1;
                entry.last_failure = now;
            }
            Some(entry) => {
                entry.failures = entry.failures.saturating_add(1);
                entry.last_failure = now;
            }
            None => {
                entries.insert(
                    identifier.to_string(),
                    AttemptWindow {
                        failures: 1,
                        last_failure: now,
                    },
                );
            }
        }
    }

    fn is_locked(&self, identifier: &str) -> bool {
        let entries = self.lock_entries();
        entries.get(identifier).is_some_and(|entry| {
            entry.failures >= self.max_attempts
                && entry.last_failure.elapsed() <= self.lockout_window
        })
    }

    fn remaining_lockout_seconds(&self, identifier: &str) -> u64 {
        let entries = self.lock_entries();
        let Some(entry) = entries.get(identifier) else {
            return 0;
        };
        if entry.failures < self.max_attempts {
            return 0;
        }
        self.lockout_window
            .saturating_sub(entry.last_failure.elapsed())
            .as_secs()
    }

    fn clear(&self, identifier: &str) {
        let mut entries = self.lock_entries();
        entries.remove(identifier);
    }
}

/// Limiter that never locks anyone out; used in tests.
#[derive(Clone, Copy, Debug)]
pub struct NoopLoginLimiter;

impl LoginRateLimiter for NoopLoginLimiter {
    fn record_failure(&self, _identifier: &str) {}

    fn is_locked(&self, _identifier: &str) -> bool {
        false
    }

    fn remaining_lockout_seconds(&self, _identifier: &str) -> u64 {
        0
    }

    fn clear(&self, _identifier: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const ID: &str = "alice@example.com";

    #[test]
    fn fresh_identifier_is_not_locked() {
        let limiter = InMemoryLoginLimiter::new();
        assert!(!limiter.is_locked(ID));
        assert_eq!(limiter.remaining_lockout_seconds(ID), 0);
    }

    #[test]
    fn locks_after_max_attempts() {
        let limiter = InMemoryLoginLimiter::new();
        for _ in 0..4 {
            limiter.record_failure(ID);
            assert!(!limiter.is_locked(ID));
        }
        limiter.record_failure(ID);
        assert!(limiter.is_locked(ID));
        assert!(limiter.remaining_lockout_seconds(ID) > 0);
        assert!(limiter.remaining_lockout_seconds(ID) <= 300);
    }

    #[test]
    fn lockout_expires_after_window() {
        let limiter = InMemoryLoginLimiter::with_limits(2, Duration::from_millis(20));
        limiter.record_failure(ID);
        limiter.record_failure(ID);
        assert!(limiter.is_locked(ID));

        thread::sleep(Duration::from_millis(40));
        assert!(!limiter.is_locked(ID));
        assert_eq!(limiter.remaining_lockout_seconds(ID), 0);
    }

    #[test]
    fn stale_window_resets_counter() {
        let limiter = InMemoryLoginLimiter::with_limits(2, Duration::from_millis(20));
        limiter.record_failure(ID);
        thread::sleep(Duration::from_millis(40));

        // First failure after the window starts a fresh count of 1.
        limiter.record_failure(ID);
        assert!(!limiter.is_locked(ID));
        limiter.record_failure(ID);
        assert!(limiter.is_locked(ID));
    }

    #[test]
    fn failures_slide_the_window_forward() {
        let limiter = InMemoryLoginLimiter::with_limits(2, Duration::from_millis(60));
        limiter.record_failure(ID);
        limiter.record_failure(ID);
        thread::sleep(Duration::from_millis(30));

        // A new failure inside the window pushes the lockout out again.
        limiter.record_failure(ID);
        thread::sleep(Duration::from_millis(40));
        assert!(limiter.is_locked(ID));
    }

    #[test]
    fn clear_resets_to_absent() {
        let limiter = InMemoryLoginLimiter::with_limits(2, Duration::from_secs(300));
        limiter.record_failure(ID);
        limiter.record_failure(ID);
        assert!(limiter.is_locked(ID));

        limiter.clear(ID);
        assert!(!limiter.is_locked(ID));
        assert_eq!(limiter.remaining_lockout_seconds(ID), 0);
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = InMemoryLoginLimiter::with_limits(2, Duration::from_secs(300));
        limiter.record_failure(ID);
        limiter.record_failure(ID);
        assert!(limiter.is_locked(ID));
        assert!(!limiter.is_locked("bob@example.com"));
    }

    #[test]
    fn concurrent_failures_do_not_corrupt_the_counter() {
        let limiter = Arc::new(InMemoryLoginLimiter::with_limits(64, Duration::from_secs(300)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    for _ in 0..8 {
                        limiter.record_failure(ID);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread panicked");
        }
        // 64 failures across threads must reach the limit exactly, not lose updates.
        assert!(limiter.is_locked(ID));
    }

    #[test]
    fn noop_limiter_never_locks() {
        let limiter = NoopLoginLimiter;
        for _ in 0..10 {
            limiter.record_failure(ID);
        }
        assert!(!limiter.is_locked(ID));
        assert_eq!(limiter.remaining_lockout_seconds(ID), 0);
    }
}
