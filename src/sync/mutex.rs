use crate::error::SyncResult;
use crate::sync::condition::MutableMutexCondition;
use crate::thread::{self, ThreadId};
use crate::time::{self, Clock};

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

/// A niladic query over external state, used to guard condition waits.
pub type Predicate = Box<dyn Fn() -> bool + Send + Sync>;

/// A non-reentrant mutual exclusion lock.
///
/// Ownership is tied to the calling thread: the thread that acquires the
/// mutex is the only one allowed to release it, watch its conditions or
/// signal them. Acquiring a mutex the calling thread already owns is a
/// contract violation rather than a recursive acquisition.
///
/// Most callers use the scoped helpers ([`lock`](crate::lock),
/// [`critical_section`](crate::critical_section)) instead of pairing
/// [`acquire`](Mutex::acquire) and [`release`](Mutex::release) by hand.
pub trait Mutex: Send + Sync {
    /// Returns `true` if thread `id` currently holds the mutex.
    fn is_owned_by_thread(&self, id: ThreadId) -> bool;

    /// Returns `true` if the calling thread currently holds the mutex.
    fn is_owned_by_current_thread(&self) -> bool {
        self.is_owned_by_thread(thread::current_id())
    }

    /// Attempts to take the mutex without blocking.
    ///
    /// # Errors
    ///
    /// [`ContractViolation::AlreadyOwned`](crate::ContractViolation::AlreadyOwned)
    /// if the calling thread already owns the mutex.
    fn try_acquire(&self) -> SyncResult<bool>;

    /// Blocks until the mutex is taken by the calling thread.
    ///
    /// # Errors
    ///
    /// [`ContractViolation::AlreadyOwned`](crate::ContractViolation::AlreadyOwned)
    /// if the calling thread already owns the mutex.
    fn acquire(&self) -> SyncResult<()>;

    /// Releases the mutex.
    ///
    /// # Errors
    ///
    /// [`ContractViolation::NotOwned`](crate::ContractViolation::NotOwned)
    /// if the calling thread does not own the mutex.
    fn release(&self) -> SyncResult<()>;

    /// Creates a condition bound to this mutex.
    fn create_condition(&self) -> Arc<dyn MutableMutexCondition>;

    /// Creates a condition whose watches return only once `predicate` holds
    /// (or their deadline passes).
    fn create_condition_with(&self, predicate: Predicate) -> Arc<dyn MutableMutexCondition>;
}

/// A [`Mutex`] whose acquisitions can be bounded by a deadline.
///
/// Deadlines are absolute instants on [`clock`](ClockMutex::clock). A timed
/// out acquisition fails with [`SyncError::Timeout`](crate::SyncError::Timeout)
/// and leaves the mutex exactly as it was, so it is safe to retry.
pub trait ClockMutex: Mutex {
    /// Returns the clock deadlines are evaluated against.
    fn clock(&self) -> &Arc<dyn Clock>;

    /// Blocks until the mutex is taken or `deadline` passes.
    ///
    /// A deadline at or before the current time fails without blocking.
    fn acquire_until(&self, deadline: DateTime<Utc>) -> SyncResult<()>;

    /// Blocks until the mutex is taken or `timeout` elapses.
    fn acquire_for(&self, timeout: TimeDelta) -> SyncResult<()> {
        let deadline = time::deadline_after(self.clock().as_ref(), timeout)?;
        self.acquire_until(deadline)
    }
}
