use crate::contract;
use crate::error::{ContractViolation, SyncError, SyncResult};
use crate::time::Clock;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

/// A clock that only moves when told to.
///
/// `FakeClock` lets tests express arbitrarily long timeouts without waiting
/// in real time: a thread blocked on a deadline keeps polling this clock and
/// gives up as soon as another thread advances it past the deadline.
///
/// # Examples
///
/// ```rust
/// use cadentis_sync::time::{Clock, FakeClock};
/// use chrono::{DateTime, TimeDelta};
///
/// let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
/// let clock = FakeClock::new(start);
///
/// clock.advance(TimeDelta::seconds(5)).unwrap();
/// assert_eq!(clock.now(), start + TimeDelta::seconds(5));
/// ```
#[derive(Debug)]
pub struct FakeClock {
    /// The instant returned by `now`.
    current: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    /// Creates a clock frozen at `initial`.
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    /// Moves the clock forward by `by` and returns it for chaining.
    ///
    /// A zero advance leaves the clock unchanged.
    ///
    /// # Errors
    ///
    /// Fails with [`ContractViolation::NegativeAdvance`] if `by` is negative,
    /// and with [`SyncError::DeadlineOverflow`] if the result is not
    /// representable. The clock is unchanged in both cases.
    pub fn advance(&self, by: TimeDelta) -> SyncResult<&Self> {
        contract::require(by >= TimeDelta::zero(), ContractViolation::NegativeAdvance { by })?;

        let mut current = self.current.lock();
        *current = current
            .checked_add_signed(by)
            .ok_or(SyncError::DeadlineOverflow)?;

        Ok(self)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}
