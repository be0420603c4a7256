//! Current-thread utilities.
//!
//! This module identifies the calling thread and yields the processor to
//! other runnable threads. The spin backend relies on both: ownership is
//! recorded as a [`ThreadId`], and every busy-wait loop eventually calls
//! [`yield_now`].
//!
//! Yielding goes straight to the host scheduler; the concrete call is
//! selected at compile time depending on the target platform.

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;

#[cfg(windows)]
use windows as platform;

use std::cell::Cell;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of identifiers handed out so far.
static ISSUED: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Identifier of the current thread, assigned on first use.
    static CURRENT_ID: Cell<Option<ThreadId>> = const { Cell::new(None) };
}

/// A process-unique identifier for a thread.
///
/// Identifiers are never reused, even after the thread exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(NonZeroU64);

impl ThreadId {
    /// Returns the raw, non-zero value of this identifier.
    pub fn as_u64(self) -> u64 {
        self.0.get()
    }

    /// Rebuilds an identifier from its raw value; `0` maps to `None`.
    pub(crate) fn from_u64(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ThreadId)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}

/// Returns the identifier of the calling thread.
///
/// Two calls from the same thread always return equal identifiers.
pub fn current_id() -> ThreadId {
    CURRENT_ID.with(|cell| match cell.get() {
        Some(id) => id,
        None => {
            let issued = ISSUED.fetch_add(1, Ordering::Relaxed);
            // Zero is reserved for "no thread", so identifiers start at 1.
            let id = ThreadId(NonZeroU64::MIN.saturating_add(issued));
            cell.set(Some(id));
            id
        }
    })
}

/// Hints the scheduler to run other threads.
///
/// Never blocks indefinitely and cannot fail.
pub fn yield_now() {
    #[cfg(any(unix, windows))]
    platform::sys_yield();

    #[cfg(not(any(unix, windows)))]
    std::thread::yield_now();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_stable() {
        assert_eq!(current_id(), current_id());
    }

    #[test]
    fn test_ids_differ_between_threads() {
        let here = current_id();
        let there = std::thread::spawn(current_id).join().unwrap();

        assert_ne!(here, there);
    }

    #[test]
    fn test_raw_round_trip() {
        let id = current_id();
        assert_eq!(ThreadId::from_u64(id.as_u64()), Some(id));
        assert_eq!(ThreadId::from_u64(0), None);
    }

    #[test]
    fn test_yield_returns() {
        for _ in 0..16 {
            yield_now();
        }
    }
}
