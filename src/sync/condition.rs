use crate::error::SyncResult;
use crate::sync::mutex::Predicate;
use crate::time::{self, Clock};

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, trace};

/// The waiting side of a condition variable bound to one mutex.
///
/// Every watch requires the calling thread to own the mutex. The mutex is
/// released while waiting and owned again when the call returns, on every
/// path including an expired deadline.
///
/// Without a predicate a watch waits for a single wake-up. With one, the
/// predicate is re-evaluated after every wake-up and the watch only returns
/// once it holds. Signals may coalesce: several signals observed by one
/// waiter count as one wake-up.
///
/// A watch bounded by a deadline does not report whether it returned
/// because of a wake-up or because time ran out. Callers re-check their
/// predicate or the clock afterwards.
pub trait MutexCondition: Send + Sync {
    /// Returns the clock deadlines are evaluated against.
    fn clock(&self) -> &Arc<dyn Clock>;

    /// Releases the mutex, waits, and reacquires it.
    fn watch(&self) -> SyncResult<()>;

    /// Like [`watch`](MutexCondition::watch), but stops waiting once
    /// `deadline` passes.
    fn watch_until(&self, deadline: DateTime<Utc>) -> SyncResult<()>;

    /// Like [`watch_until`](MutexCondition::watch_until) with a deadline of
    /// `now + timeout`.
    fn watch_for(&self, timeout: TimeDelta) -> SyncResult<()> {
        let deadline = time::deadline_after(self.clock().as_ref(), timeout)?;
        self.watch_until(deadline)
    }
}

/// The signalling side of a condition variable.
pub trait MutableMutexCondition: MutexCondition {
    /// Wakes every thread currently watching this condition.
    ///
    /// The calling thread must own the mutex and still owns it afterwards.
    fn signal(&self) -> SyncResult<()>;
}

/// Drives the predicate-guarded wait shared by both backends.
///
/// `wait_once` releases the mutex, waits for one wake-up (or the deadline),
/// reacquires the mutex and returns `true` if the deadline passed.
pub(crate) fn watch_loop(predicate: Option<&Predicate>, mut wait_once: impl FnMut() -> bool) {
    if predicate.is_some_and(|holds| holds()) {
        return;
    }

    loop {
        let timed_out = wait_once();

        let Some(holds) = predicate else {
            if timed_out {
                debug!("condition watch reached its deadline without a signal");
            }
            return;
        };

        if holds() {
            return;
        }

        if timed_out {
            debug!("condition watch reached its deadline before its predicate held");
            return;
        }

        trace!("condition woken before its predicate held, waiting again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_satisfied_predicate_skips_waiting() {
        let predicate: Predicate = Box::new(|| true);
        let mut waits = 0;

        watch_loop(Some(&predicate), || {
            waits += 1;
            false
        });

        assert_eq!(waits, 0);
    }

    #[test]
    fn test_no_predicate_waits_once() {
        let mut waits = 0;

        watch_loop(None, || {
            waits += 1;
            false
        });

        assert_eq!(waits, 1);
    }

    #[test]
    fn test_predicate_rechecked_after_each_wake() {
        let checks = Arc::new(AtomicUsize::new(0));
        let predicate: Predicate = {
            let checks = checks.clone();
            Box::new(move || checks.fetch_add(1, Ordering::SeqCst) >= 3)
        };
        let mut waits = 0;

        watch_loop(Some(&predicate), || {
            waits += 1;
            false
        });

        assert_eq!(waits, 3);
        assert_eq!(checks.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_deadline_stops_the_loop() {
        let predicate: Predicate = Box::new(|| false);
        let mut waits = 0;

        watch_loop(Some(&predicate), || {
            waits += 1;
            waits == 2
        });

        assert_eq!(waits, 2);
    }
}
