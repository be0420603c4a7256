//! Mutexes and condition variables.
//!
//! Two interchangeable backends implement the [`Mutex`] and [`ClockMutex`]
//! capabilities:
//! - [`MonitorMutex`]: parks waiting threads on the host scheduler,
//! - [`SpinMutex`]: busy-waits on a single atomic word, never parking.
//!
//! Each backend hands out conditions ([`MutableMutexCondition`]) that
//! release the mutex while waiting and own it again on return.
//!
//! ## Design notes
//!
//! - Mutexes are non-reentrant: acquiring a mutex the calling thread already
//!   owns is a contract violation.
//! - Deadlines are instants on an injected [`Clock`](crate::time::Clock), so
//!   tests can drive timeouts with a [`FakeClock`](crate::time::FakeClock).
//! - Mutex handles are cheap to clone and safe to share between threads.
//!
//! Most users build a mutex through [`MutexBuilder`] and use the scoped
//! helpers ([`lock`], [`critical_section`]) rather than pairing acquire and
//! release by hand.

mod atomic;
mod backoff;
mod builder;
mod condition;
mod guard;
mod monitor;
mod mutex;
mod spin;

pub use atomic::compare_and_set;
pub use backoff::DEFAULT_SPIN_LIMIT;
pub use builder::{Backend, MutexBuilder};
pub use condition::{MutableMutexCondition, MutexCondition};
pub use guard::{
    MutexGuard, critical_section, critical_section_for, critical_section_until, lock, lock_for,
    lock_until,
};
pub use monitor::{MonitorCondition, MonitorMutex};
pub use mutex::{ClockMutex, Mutex, Predicate};
pub use spin::{SpinCondition, SpinMutex};
