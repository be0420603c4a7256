use crate::error::SyncResult;
use crate::sync::mutex::{ClockMutex, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use std::marker::PhantomData;
use tracing::warn;

/// A scoped acquisition of a [`Mutex`].
///
/// The mutex is released exactly once: either explicitly through
/// [`unlock`](MutexGuard::unlock) or when the guard is dropped, which also
/// covers early returns and unwinding panics.
///
/// Ownership belongs to the acquiring thread, so the guard cannot be sent
/// to another thread.
#[must_use = "the mutex is released as soon as the guard is dropped"]
pub struct MutexGuard<'a, M: Mutex + ?Sized> {
    mutex: &'a M,
    released: bool,
    _not_send: PhantomData<*const ()>,
}

impl<'a, M: Mutex + ?Sized> MutexGuard<'a, M> {
    fn new(mutex: &'a M) -> Self {
        Self {
            mutex,
            released: false,
            _not_send: PhantomData,
        }
    }

    /// Returns the guarded mutex.
    pub fn mutex(&self) -> &'a M {
        self.mutex
    }

    /// Releases the mutex now and reports a failed release.
    pub fn unlock(mut self) -> SyncResult<()> {
        self.released = true;
        self.mutex.release()
    }
}

impl<M: Mutex + ?Sized> Drop for MutexGuard<'_, M> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        self.released = true;
        if let Err(err) = self.mutex.release() {
            warn!(%err, "failed to release mutex on guard drop");
        }
    }
}

/// Acquires `mutex` and returns a guard that releases it.
pub fn lock<M: Mutex + ?Sized>(mutex: &M) -> SyncResult<MutexGuard<'_, M>> {
    mutex.acquire()?;
    Ok(MutexGuard::new(mutex))
}

/// Acquires `mutex` before `deadline` and returns a guard that releases it.
pub fn lock_until<M: ClockMutex + ?Sized>(
    mutex: &M,
    deadline: DateTime<Utc>,
) -> SyncResult<MutexGuard<'_, M>> {
    mutex.acquire_until(deadline)?;
    Ok(MutexGuard::new(mutex))
}

/// Acquires `mutex` within `timeout` and returns a guard that releases it.
pub fn lock_for<M: ClockMutex + ?Sized>(
    mutex: &M,
    timeout: TimeDelta,
) -> SyncResult<MutexGuard<'_, M>> {
    mutex.acquire_for(timeout)?;
    Ok(MutexGuard::new(mutex))
}

/// Runs `action` while holding `mutex`.
///
/// The mutex is released exactly once whether `action` returns or panics.
///
/// # Examples
///
/// ```rust
/// use cadentis_sync::{MutexBuilder, critical_section};
///
/// let mutex = MutexBuilder::new().build();
/// let value = critical_section(mutex.as_ref(), || 40 + 2).unwrap();
///
/// assert_eq!(value, 42);
/// ```
pub fn critical_section<M, F, R>(mutex: &M, action: F) -> SyncResult<R>
where
    M: Mutex + ?Sized,
    F: FnOnce() -> R,
{
    let guard = lock(mutex)?;
    let output = action();
    guard.unlock()?;
    Ok(output)
}

/// Runs `action` while holding `mutex`, acquired before `deadline`.
pub fn critical_section_until<M, F, R>(mutex: &M, deadline: DateTime<Utc>, action: F) -> SyncResult<R>
where
    M: ClockMutex + ?Sized,
    F: FnOnce() -> R,
{
    let guard = lock_until(mutex, deadline)?;
    let output = action();
    guard.unlock()?;
    Ok(output)
}

/// Runs `action` while holding `mutex`, acquired within `timeout`.
pub fn critical_section_for<M, F, R>(mutex: &M, timeout: TimeDelta, action: F) -> SyncResult<R>
where
    M: ClockMutex + ?Sized,
    F: FnOnce() -> R,
{
    let guard = lock_for(mutex, timeout)?;
    let output = action();
    guard.unlock()?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SpinMutex;
    use crate::time::SystemClock;
    use std::sync::Arc;

    #[test]
    fn test_guard_releases_on_drop() {
        let mutex = SpinMutex::new(Arc::new(SystemClock::new()));

        {
            let guard = lock(&mutex).unwrap();
            assert!(guard.mutex().is_owned_by_current_thread());
        }

        assert!(!mutex.is_owned_by_current_thread());
    }

    #[test]
    fn test_unlock_reports_release_errors() {
        let mutex = SpinMutex::new(Arc::new(SystemClock::new()));
        let guard = lock(&mutex).unwrap();

        mutex.release().unwrap();

        assert!(guard.unlock().unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_critical_section_returns_value() {
        let mutex = SpinMutex::new(Arc::new(SystemClock::new()));

        let owned = critical_section(&mutex, || mutex.is_owned_by_current_thread()).unwrap();

        assert!(owned);
        assert!(!mutex.is_owned_by_current_thread());
    }
}
