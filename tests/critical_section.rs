use cadentis_sync::thread::ThreadId;
use cadentis_sync::{
    Clock, ClockMutex, MutableMutexCondition, Mutex, Predicate, SpinMutex, SyncResult,
    SystemClock, critical_section, critical_section_for, lock,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delegates to a spin mutex and counts releases.
struct CountingMutex {
    inner: SpinMutex,
    releases: AtomicUsize,
}

impl CountingMutex {
    fn new() -> Self {
        Self {
            inner: SpinMutex::new(Arc::new(SystemClock::new())),
            releases: AtomicUsize::new(0),
        }
    }

    fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Mutex for CountingMutex {
    fn is_owned_by_thread(&self, id: ThreadId) -> bool {
        self.inner.is_owned_by_thread(id)
    }

    fn try_acquire(&self) -> SyncResult<bool> {
        self.inner.try_acquire()
    }

    fn acquire(&self) -> SyncResult<()> {
        self.inner.acquire()
    }

    fn release(&self) -> SyncResult<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release()
    }

    fn create_condition(&self) -> Arc<dyn MutableMutexCondition> {
        self.inner.create_condition()
    }

    fn create_condition_with(&self, predicate: Predicate) -> Arc<dyn MutableMutexCondition> {
        self.inner.create_condition_with(predicate)
    }
}

impl ClockMutex for CountingMutex {
    fn clock(&self) -> &Arc<dyn Clock> {
        self.inner.clock()
    }

    fn acquire_until(&self, deadline: DateTime<Utc>) -> SyncResult<()> {
        self.inner.acquire_until(deadline)
    }
}

#[test]
fn test_releases_once_on_success() {
    let mutex = CountingMutex::new();

    let value = critical_section(&mutex, || 7).unwrap();

    assert_eq!(value, 7);
    assert_eq!(mutex.releases(), 1);
    assert!(!mutex.is_owned_by_current_thread());
}

#[test]
fn test_releases_once_when_action_panics() {
    let mutex = CountingMutex::new();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        critical_section(&mutex, || -> u32 { panic!("boom") })
    }));

    assert!(outcome.is_err(), "the panic should propagate");
    assert_eq!(mutex.releases(), 1);
    assert!(!mutex.is_owned_by_current_thread());
}

#[test]
fn test_releases_once_when_action_fails() {
    let mutex = CountingMutex::new();

    let result = critical_section(&mutex, || "nope".parse::<u32>()).unwrap();

    assert!(result.is_err());
    assert_eq!(mutex.releases(), 1);
}

#[test]
fn test_guard_releases_on_early_return() {
    fn first_even(mutex: &CountingMutex, values: &[u32]) -> Option<u32> {
        let _guard = lock(mutex).ok()?;
        for value in values {
            if value % 2 == 0 {
                return Some(*value);
            }
        }
        None
    }

    let mutex = CountingMutex::new();

    assert_eq!(first_even(&mutex, &[1, 3, 4, 5]), Some(4));
    assert_eq!(mutex.releases(), 1);
    assert!(!mutex.is_owned_by_current_thread());
}

#[test]
fn test_reentrant_critical_section_is_rejected() {
    let mutex = CountingMutex::new();

    let nested = critical_section(&mutex, || critical_section(&mutex, || ())).unwrap();

    assert!(nested.unwrap_err().is_contract_violation());
    assert_eq!(mutex.releases(), 1);
}

#[test]
fn test_timed_critical_section_skips_action_on_timeout() {
    let mutex = CountingMutex::new();
    let runs = AtomicUsize::new(0);

    mutex.acquire().unwrap();
    let result = std::thread::scope(|scope| {
        scope
            .spawn(|| {
                critical_section_for(&mutex, TimeDelta::milliseconds(10), || {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
            })
            .join()
            .unwrap()
    });
    mutex.release().unwrap();

    assert!(result.unwrap_err().is_timeout());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(mutex.releases(), 1);
}
