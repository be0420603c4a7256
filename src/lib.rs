//! # Cadentis Sync
//!
//! **Cadentis Sync** is the blocking synchronization layer of the **Nebula**
//! ecosystem: a non-reentrant mutex with two pluggable backends, condition
//! variables bound to it, and deadlines evaluated against an injectable clock.
//!
//! It sits underneath higher-level utilities (streams, events) and offers:
//!
//! - A **monitor backend** that parks waiting threads on the host scheduler
//! - A **spin backend** built only on compare-and-set and yielding
//! - **Deadline-bounded acquisition** that fails with a timeout instead of
//!   blocking forever
//! - **Predicate-guarded condition waits** that survive spurious wake-ups
//! - **Scoped acquisition** that releases on every exit path
//! - A **fake clock** for deterministic timeout tests
//!
//! ## Quick Start
//!
//! ```rust
//! use cadentis_sync::{Backend, MutexBuilder, critical_section};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let mutex = MutexBuilder::new().backend(Backend::Spin).build();
//! let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let mutex = mutex.clone();
//!         let counter = counter.clone();
//!         thread::spawn(move || {
//!             critical_section(mutex.as_ref(), || {
//!                 counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!             })
//!             .unwrap();
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: Mutexes, conditions, scoped acquisition and the builder
//! - [`time`]: System and fake clocks
//! - [`thread`]: Current-thread identifiers and yielding

mod contract;
mod error;

pub mod sync;
pub mod thread;
pub mod time;

pub use error::{ContractViolation, SyncError, SyncResult};
pub use sync::{
    Backend, ClockMutex, MonitorMutex, MutableMutexCondition, Mutex, MutexBuilder,
    MutexCondition, MutexGuard, Predicate, SpinMutex, critical_section, critical_section_for,
    critical_section_until, lock, lock_for, lock_until,
};
pub use time::{Clock, FakeClock, SystemClock};
