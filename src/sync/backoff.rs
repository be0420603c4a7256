use crate::thread;

use std::hint;

/// Default number of busy spins before a waiting thread starts yielding.
pub const DEFAULT_SPIN_LIMIT: u32 = 64;

/// Busy-wait pacing for spin loops.
///
/// The first `limit` calls to [`snooze`](Backoff::snooze) only issue a
/// spin-loop hint; after that every call yields to the scheduler. A spinning
/// thread is never parked.
#[derive(Debug)]
pub(crate) struct Backoff {
    spins: u32,
    limit: u32,
}

impl Backoff {
    pub(crate) fn new(limit: u32) -> Self {
        Self { spins: 0, limit }
    }

    pub(crate) fn snooze(&mut self) {
        if self.spins < self.limit {
            self.spins += 1;
            hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }
}
