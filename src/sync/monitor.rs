use crate::contract;
use crate::error::{ContractViolation, SyncError, SyncResult};
use crate::sync::condition::{self, MutableMutexCondition, MutexCondition};
use crate::sync::mutex::{ClockMutex, Mutex, Predicate};
use crate::thread::{self, ThreadId};
use crate::time::{self, Clock};

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex as HostMutex, MutexGuard as HostGuard};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Longest host-time sleep between two reads of a non-system clock.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct MonitorState {
    /// Thread currently holding the monitor.
    owner: Option<ThreadId>,

    /// Number of pulses so far. Only compared for change, so it may wrap.
    pulses: u64,
}

/// The host lock object shared by a mutex and all of its conditions.
#[derive(Debug)]
struct Monitor {
    state: HostMutex<MonitorState>,

    /// Threads waiting to enter the monitor.
    entry: Condvar,

    /// Threads waiting for a pulse.
    waiters: Condvar,
}

impl Monitor {
    fn new() -> Self {
        Self {
            state: HostMutex::new(MonitorState {
                owner: None,
                pulses: 0,
            }),
            entry: Condvar::new(),
            waiters: Condvar::new(),
        }
    }

    fn is_owned_by(&self, id: ThreadId) -> bool {
        self.state.lock().owner == Some(id)
    }

    /// Blocks until the monitor is free, then takes it.
    fn enter(&self, state: &mut HostGuard<'_, MonitorState>, me: ThreadId) {
        while state.owner.is_some() {
            self.entry.wait(state);
        }
        state.owner = Some(me);
    }

    fn exit(&self, state: &mut HostGuard<'_, MonitorState>) {
        state.owner = None;
        self.entry.notify_one();
    }
}

/// A mutex that blocks on the host scheduler.
///
/// `MonitorMutex` parks waiting threads on a `parking_lot` condition
/// variable instead of spinning. Conditions created from it share its
/// monitor: a signal on any of them wakes every thread watching any
/// condition of the same mutex.
///
/// Clones share the same underlying lock.
///
/// # Examples
///
/// ```rust
/// use cadentis_sync::{ClockMutex, MonitorMutex, Mutex, SystemClock};
/// use chrono::TimeDelta;
/// use std::sync::Arc;
///
/// let mutex = MonitorMutex::new(Arc::new(SystemClock::new()));
///
/// mutex.acquire_for(TimeDelta::milliseconds(50)).unwrap();
/// assert!(mutex.is_owned_by_current_thread());
/// mutex.release().unwrap();
/// ```
#[derive(Clone)]
pub struct MonitorMutex {
    monitor: Arc<Monitor>,
    clock: Arc<dyn Clock>,
}

impl MonitorMutex {
    /// Creates an unlocked mutex whose deadlines are read from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            monitor: Arc::new(Monitor::new()),
            clock,
        }
    }

    fn try_enter(&self, me: ThreadId) -> bool {
        let mut state = self.monitor.state.lock();
        if state.owner.is_some() {
            return false;
        }

        state.owner = Some(me);
        true
    }

    /// Times out on the host condition variable.
    fn enter_until_native(&self, me: ThreadId, deadline: DateTime<Utc>) -> SyncResult<()> {
        let Some(left) = time::remaining(self.clock.as_ref(), deadline) else {
            return Err(SyncError::Timeout { deadline });
        };

        let Some(until) = Instant::now().checked_add(left) else {
            // Beyond what the host can represent: indistinguishable from forever.
            let mut state = self.monitor.state.lock();
            self.monitor.enter(&mut state, me);
            return Ok(());
        };

        let mut state = self.monitor.state.lock();
        while state.owner.is_some() {
            trace!(owner = ?state.owner, "monitor contended, waiting with deadline");
            let result = self.monitor.entry.wait_until(&mut state, until);
            if result.timed_out() && state.owner.is_some() {
                debug!(%deadline, "monitor acquisition timed out");
                return Err(SyncError::Timeout { deadline });
            }
        }

        state.owner = Some(me);
        Ok(())
    }

    /// Polls the injected clock between non-blocking attempts.
    fn enter_until_polling(&self, me: ThreadId, deadline: DateTime<Utc>) -> SyncResult<()> {
        loop {
            if self.clock.now() >= deadline {
                debug!(%deadline, "monitor acquisition timed out");
                return Err(SyncError::Timeout { deadline });
            }

            if self.try_enter(me) {
                return Ok(());
            }

            thread::yield_now();
        }
    }
}

impl fmt::Debug for MonitorMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorMutex")
            .field("owner", &self.monitor.state.lock().owner)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Mutex for MonitorMutex {
    fn is_owned_by_thread(&self, id: ThreadId) -> bool {
        self.monitor.is_owned_by(id)
    }

    fn try_acquire(&self) -> SyncResult<bool> {
        let me = thread::current_id();
        contract::require(!self.monitor.is_owned_by(me), ContractViolation::AlreadyOwned)?;

        Ok(self.try_enter(me))
    }

    fn acquire(&self) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(!self.monitor.is_owned_by(me), ContractViolation::AlreadyOwned)?;

        let mut state = self.monitor.state.lock();
        self.monitor.enter(&mut state, me);
        Ok(())
    }

    fn release(&self) -> SyncResult<()> {
        let me = thread::current_id();

        let mut state = self.monitor.state.lock();
        contract::require(state.owner == Some(me), ContractViolation::NotOwned)?;

        self.monitor.exit(&mut state);
        Ok(())
    }

    fn create_condition(&self) -> Arc<dyn MutableMutexCondition> {
        Arc::new(MonitorCondition::new(self, None))
    }

    fn create_condition_with(&self, predicate: Predicate) -> Arc<dyn MutableMutexCondition> {
        Arc::new(MonitorCondition::new(self, Some(predicate)))
    }
}

impl ClockMutex for MonitorMutex {
    fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn acquire_until(&self, deadline: DateTime<Utc>) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(!self.monitor.is_owned_by(me), ContractViolation::AlreadyOwned)?;

        if self.clock.is_system() {
            self.enter_until_native(me, deadline)
        } else {
            self.enter_until_polling(me, deadline)
        }
    }
}

/// A condition bound to a [`MonitorMutex`].
///
/// Waiting parks the thread on the monitor's wait set; a signal pulses the
/// whole wait set.
pub struct MonitorCondition {
    monitor: Arc<Monitor>,
    clock: Arc<dyn Clock>,
    predicate: Option<Predicate>,
}

impl MonitorCondition {
    fn new(mutex: &MonitorMutex, predicate: Option<Predicate>) -> Self {
        Self {
            monitor: mutex.monitor.clone(),
            clock: mutex.clock.clone(),
            predicate,
        }
    }

    /// Exits the monitor, waits for the next pulse, and re-enters.
    ///
    /// Returns `true` if `deadline` passed before a pulse arrived.
    fn wait_once(&self, me: ThreadId, deadline: Option<DateTime<Utc>>) -> bool {
        let mut state = self.monitor.state.lock();
        let seen = state.pulses;
        self.monitor.exit(&mut state);

        let mut timed_out = false;
        while state.pulses == seen {
            let Some(deadline) = deadline else {
                self.monitor.waiters.wait(&mut state);
                continue;
            };

            let Some(left) = time::remaining(self.clock.as_ref(), deadline) else {
                timed_out = true;
                break;
            };

            let step = if self.clock.is_system() {
                left
            } else {
                left.min(POLL_INTERVAL)
            };
            self.monitor.waiters.wait_for(&mut state, step);
        }

        self.monitor.enter(&mut state, me);
        timed_out
    }

    fn watch_inner(&self, deadline: Option<DateTime<Utc>>) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(self.monitor.is_owned_by(me), ContractViolation::NotOwned)?;

        condition::watch_loop(self.predicate.as_ref(), || self.wait_once(me, deadline));

        contract::ensure(self.monitor.is_owned_by(me), ContractViolation::OwnershipLost)
    }
}

impl fmt::Debug for MonitorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorCondition")
            .field("guarded", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

impl MutexCondition for MonitorCondition {
    fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn watch(&self) -> SyncResult<()> {
        self.watch_inner(None)
    }

    fn watch_until(&self, deadline: DateTime<Utc>) -> SyncResult<()> {
        self.watch_inner(Some(deadline))
    }
}

impl MutableMutexCondition for MonitorCondition {
    fn signal(&self) -> SyncResult<()> {
        let me = thread::current_id();

        let mut state = self.monitor.state.lock();
        contract::require(state.owner == Some(me), ContractViolation::NotOwned)?;

        state.pulses = state.pulses.wrapping_add(1);
        self.monitor.waiters.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{FakeClock, SystemClock};
    use chrono::TimeDelta;

    fn system() -> MonitorMutex {
        MonitorMutex::new(Arc::new(SystemClock::new()))
    }

    #[test]
    fn test_acquire_release() {
        let mutex = system();

        mutex.acquire().unwrap();
        assert!(mutex.is_owned_by_current_thread());

        mutex.release().unwrap();
        assert!(!mutex.is_owned_by_current_thread());
    }

    #[test]
    fn test_reentry_is_a_contract_violation() {
        let mutex = system();
        mutex.acquire().unwrap();

        assert_eq!(
            mutex.acquire(),
            Err(SyncError::Contract(ContractViolation::AlreadyOwned))
        );
        assert_eq!(
            mutex.try_acquire(),
            Err(SyncError::Contract(ContractViolation::AlreadyOwned))
        );
        assert!(mutex.is_owned_by_current_thread());
    }

    #[test]
    fn test_release_without_owning() {
        let mutex = system();

        assert_eq!(
            mutex.release(),
            Err(SyncError::Contract(ContractViolation::NotOwned))
        );
    }

    #[test]
    fn test_try_acquire_fails_while_held_elsewhere() {
        let mutex = system();
        mutex.acquire().unwrap();

        let other = mutex.clone();
        let acquired = std::thread::spawn(move || other.try_acquire().unwrap())
            .join()
            .unwrap();

        assert!(!acquired);
    }

    #[test]
    fn test_native_timeout_leaves_state_unchanged() {
        let mutex = system();
        mutex.acquire().unwrap();
        let holder = thread::current_id();

        let other = mutex.clone();
        let result = std::thread::spawn(move || {
            let result = other.acquire_for(TimeDelta::milliseconds(20));
            (result, other.is_owned_by_current_thread())
        })
        .join()
        .unwrap();

        assert!(matches!(result.0, Err(SyncError::Timeout { .. })));
        assert!(!result.1);
        assert!(mutex.is_owned_by_thread(holder));
    }

    #[test]
    fn test_fake_clock_past_deadline_fails_immediately() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mutex = MonitorMutex::new(Arc::new(FakeClock::new(start)));

        assert_eq!(
            mutex.acquire_until(start),
            Err(SyncError::Timeout { deadline: start })
        );
        assert!(!mutex.is_owned_by_current_thread());
    }

    #[test]
    fn test_signal_requires_ownership() {
        let mutex = system();
        let condition = mutex.create_condition();

        assert_eq!(
            condition.signal(),
            Err(SyncError::Contract(ContractViolation::NotOwned))
        );
        assert_eq!(
            condition.watch(),
            Err(SyncError::Contract(ContractViolation::NotOwned))
        );
    }

    #[test]
    fn test_watch_times_out_holding_the_mutex() {
        let mutex = system();
        let condition = mutex.create_condition_with(Box::new(|| false));

        mutex.acquire().unwrap();
        condition.watch_for(TimeDelta::milliseconds(10)).unwrap();

        assert!(mutex.is_owned_by_current_thread());
        mutex.release().unwrap();
    }
}
