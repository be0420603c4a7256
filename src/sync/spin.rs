use crate::contract;
use crate::error::{ContractViolation, SyncError, SyncResult};
use crate::sync::atomic::compare_and_set;
use crate::sync::backoff::{Backoff, DEFAULT_SPIN_LIMIT};
use crate::sync::condition::{self, MutableMutexCondition, MutexCondition};
use crate::sync::mutex::{ClockMutex, Mutex, Predicate};
use crate::thread::{self, ThreadId};
use crate::time::Clock;

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, trace};

/// The lock is free.
const NOT_OWNED: usize = 0;

/// The lock is held; `owner` names the holder.
const OWNED: usize = 1;

/// Raw owner value meaning "no thread".
const NO_OWNER: u64 = 0;

#[derive(Debug)]
struct SpinCore {
    /// `NOT_OWNED` or `OWNED`, only ever changed by compare-and-set.
    state: AtomicUsize,

    /// Raw id of the holder. Written right after the acquiring exchange and
    /// cleared right before the releasing one.
    owner: AtomicU64,

    /// Busy spins before a waiter starts yielding.
    spin_limit: u32,
}

/// A mutex built only on compare-and-set and busy waiting.
///
/// `SpinMutex` never parks a thread: contended acquisitions spin on a plain
/// read of the lock word until it looks free and only then attempt the
/// exchange (test-and-test-and-set), yielding to the scheduler once the spin
/// budget is exhausted. This trades CPU time for wake-up latency and suits
/// short critical sections.
///
/// Clones share the same underlying lock.
///
/// # Examples
///
/// ```rust
/// use cadentis_sync::{Mutex, SpinMutex, SystemClock};
/// use std::sync::Arc;
///
/// let mutex = SpinMutex::new(Arc::new(SystemClock::new()));
///
/// assert!(mutex.try_acquire().unwrap());
/// mutex.release().unwrap();
/// ```
#[derive(Clone)]
pub struct SpinMutex {
    core: Arc<SpinCore>,
    clock: Arc<dyn Clock>,
}

impl SpinMutex {
    /// Creates an unlocked mutex whose deadlines are read from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_spin_limit(clock, DEFAULT_SPIN_LIMIT)
    }

    /// Creates an unlocked mutex that spins `spin_limit` times before yielding.
    ///
    /// # Panics
    ///
    /// Panics if `spin_limit == 0`.
    pub fn with_spin_limit(clock: Arc<dyn Clock>, spin_limit: u32) -> Self {
        assert!(spin_limit > 0, "spin_limit must be > 0");

        Self {
            core: Arc::new(SpinCore {
                state: AtomicUsize::new(NOT_OWNED),
                owner: AtomicU64::new(NO_OWNER),
                spin_limit,
            }),
            clock,
        }
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(self.core.spin_limit)
    }

    fn is_locked(&self) -> bool {
        self.core.state.load(Ordering::Relaxed) == OWNED
    }

    fn owner(&self) -> Option<ThreadId> {
        if self.core.state.load(Ordering::Acquire) != OWNED {
            return None;
        }

        ThreadId::from_u64(self.core.owner.load(Ordering::Acquire))
    }

    fn try_lock(&self, me: ThreadId) -> bool {
        if !compare_and_set(&self.core.state, NOT_OWNED, OWNED) {
            return false;
        }

        self.core.owner.store(me.as_u64(), Ordering::Release);
        true
    }

    fn lock(&self, me: ThreadId) {
        let mut backoff = self.backoff();

        while !self.try_lock(me) {
            trace!("spin mutex contended");
            while self.is_locked() {
                backoff.snooze();
            }
        }
    }

    fn lock_until(&self, me: ThreadId, deadline: DateTime<Utc>) -> SyncResult<()> {
        let mut backoff = self.backoff();

        loop {
            if self.clock.now() >= deadline {
                debug!(%deadline, "spin mutex acquisition timed out");
                return Err(SyncError::Timeout { deadline });
            }

            if self.try_lock(me) {
                return Ok(());
            }

            while self.is_locked() {
                if self.clock.now() >= deadline {
                    debug!(%deadline, "spin mutex acquisition timed out");
                    return Err(SyncError::Timeout { deadline });
                }
                backoff.snooze();
            }
        }
    }

    fn unlock(&self) {
        self.core.owner.store(NO_OWNER, Ordering::Relaxed);

        // Only the owner reaches this point, so the exchange cannot lose.
        let released = compare_and_set(&self.core.state, OWNED, NOT_OWNED);
        debug_assert!(released, "spin mutex released while not locked");
    }
}

impl fmt::Debug for SpinMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinMutex")
            .field("owner", &self.owner())
            .field("spin_limit", &self.core.spin_limit)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Mutex for SpinMutex {
    fn is_owned_by_thread(&self, id: ThreadId) -> bool {
        self.owner() == Some(id)
    }

    fn try_acquire(&self) -> SyncResult<bool> {
        let me = thread::current_id();
        contract::require(!self.is_owned_by_thread(me), ContractViolation::AlreadyOwned)?;

        Ok(self.try_lock(me))
    }

    fn acquire(&self) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(!self.is_owned_by_thread(me), ContractViolation::AlreadyOwned)?;

        self.lock(me);
        Ok(())
    }

    fn release(&self) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(self.is_owned_by_thread(me), ContractViolation::NotOwned)?;

        self.unlock();
        Ok(())
    }

    fn create_condition(&self) -> Arc<dyn MutableMutexCondition> {
        Arc::new(SpinCondition::new(self.clone(), None))
    }

    fn create_condition_with(&self, predicate: Predicate) -> Arc<dyn MutableMutexCondition> {
        Arc::new(SpinCondition::new(self.clone(), Some(predicate)))
    }
}

impl ClockMutex for SpinMutex {
    fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn acquire_until(&self, deadline: DateTime<Utc>) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(!self.is_owned_by_thread(me), ContractViolation::AlreadyOwned)?;

        self.lock_until(me, deadline)
    }
}

/// A condition bound to a [`SpinMutex`].
///
/// There is no wait set to park on, so the condition keeps its own change
/// counter: [`signal`](MutableMutexCondition::signal) bumps it and watchers
/// spin until it moves. Only threads watching this same condition object
/// are woken.
pub struct SpinCondition {
    mutex: SpinMutex,
    predicate: Option<Predicate>,

    /// Bumped on every signal. Only compared for change, so it may wrap.
    signal_value: AtomicU64,
}

impl SpinCondition {
    fn new(mutex: SpinMutex, predicate: Option<Predicate>) -> Self {
        Self {
            mutex,
            predicate,
            signal_value: AtomicU64::new(0),
        }
    }

    /// Releases the mutex, spins until the next signal, and reacquires it.
    ///
    /// Returns `true` if `deadline` passed before a signal arrived.
    fn wait_once(&self, me: ThreadId, deadline: Option<DateTime<Utc>>) -> bool {
        let seen = self.signal_value.load(Ordering::Acquire);
        self.mutex.unlock();

        let mut backoff = self.mutex.backoff();
        let mut timed_out = false;
        while self.signal_value.load(Ordering::Acquire) == seen {
            if deadline.is_some_and(|deadline| self.mutex.clock.now() >= deadline) {
                timed_out = true;
                break;
            }
            backoff.snooze();
        }

        self.mutex.lock(me);
        timed_out
    }

    fn watch_inner(&self, deadline: Option<DateTime<Utc>>) -> SyncResult<()> {
        let me = thread::current_id();
        contract::require(self.mutex.is_owned_by_thread(me), ContractViolation::NotOwned)?;

        condition::watch_loop(self.predicate.as_ref(), || self.wait_once(me, deadline));

        contract::ensure(self.mutex.is_owned_by_thread(me), ContractViolation::OwnershipLost)
    }
}

impl fmt::Debug for SpinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinCondition")
            .field("signal_value", &self.signal_value.load(Ordering::Relaxed))
            .field("guarded", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

impl MutexCondition for SpinCondition {
    fn clock(&self) -> &Arc<dyn Clock> {
        &self.mutex.clock
    }

    fn watch(&self) -> SyncResult<()> {
        self.watch_inner(None)
    }

    fn watch_until(&self, deadline: DateTime<Utc>) -> SyncResult<()> {
        self.watch_inner(Some(deadline))
    }
}

impl MutableMutexCondition for SpinCondition {
    fn signal(&self) -> SyncResult<()> {
        contract::require(self.mutex.is_owned_by_current_thread(), ContractViolation::NotOwned)?;

        // Writers all hold the mutex, so the increment never races another one.
        self.signal_value.fetch_add(1, Ordering::Release);
        Ok(())
    }
}
