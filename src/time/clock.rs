use crate::error::{SyncError, SyncResult};

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::time::Duration;

/// A source of the current instant.
///
/// Deadlines handed to [`ClockMutex`](crate::ClockMutex) and
/// [`MutexCondition`](crate::MutexCondition) are absolute instants on this
/// clock, never on the host clock directly.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Returns `true` if [`now`](Clock::now) follows host time.
    ///
    /// When it does, backends may hand timeouts to the host's own blocking
    /// primitives. Otherwise they poll and compare against this clock.
    fn is_system(&self) -> bool {
        false
    }
}

/// A clock that reads the host wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new `SystemClock`.
    pub fn new() -> Self {
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn is_system(&self) -> bool {
        true
    }
}

/// Computes `clock.now() + timeout`.
pub(crate) fn deadline_after(clock: &dyn Clock, timeout: TimeDelta) -> SyncResult<DateTime<Utc>> {
    clock
        .now()
        .checked_add_signed(timeout)
        .ok_or(SyncError::DeadlineOverflow)
}

/// Returns the host duration left until `deadline`, or `None` once it has passed.
pub(crate) fn remaining(clock: &dyn Clock, deadline: DateTime<Utc>) -> Option<Duration> {
    let left = deadline.signed_duration_since(clock.now());
    if left <= TimeDelta::zero() {
        return None;
    }

    left.to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let start = clock.now();

        let mut later = clock.now();
        while later == start {
            std::thread::sleep(Duration::from_millis(1));
            later = clock.now();
        }

        assert!(later - start > TimeDelta::zero());
    }

    #[test]
    fn test_remaining_is_none_at_deadline() {
        let clock = SystemClock::new();
        let past = clock.now() - TimeDelta::seconds(1);

        assert_eq!(remaining(&clock, past), None);
    }

    #[test]
    fn test_deadline_overflow() {
        let clock = SystemClock::new();

        assert_eq!(
            deadline_after(&clock, TimeDelta::MAX),
            Err(SyncError::DeadlineOverflow)
        );
    }
}
