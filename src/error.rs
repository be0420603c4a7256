//! Error types for the synchronization layer.
//!
//! Two kinds of failure are distinguished:
//! contract violations (programmer errors such as releasing a mutex that the
//! calling thread does not own) and timeouts (an expected outcome of a
//! deadline-bounded acquisition).

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// A broken precondition or postcondition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// The calling thread tried to acquire a mutex it already owns.
    #[error("mutex is already owned by the current thread")]
    AlreadyOwned,

    /// The calling thread released, watched or signalled a mutex it does not own.
    #[error("mutex is not owned by the current thread")]
    NotOwned,

    /// A fake clock was asked to move backwards.
    #[error("clock cannot be advanced by a negative duration ({by})")]
    NegativeAdvance {
        /// The rejected advance.
        by: TimeDelta,
    },

    /// A wait returned without the caller owning the mutex again.
    #[error("mutex ownership was lost across a condition wait")]
    OwnershipLost,
}

/// Errors returned by mutexes, conditions and clocks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A precondition or postcondition did not hold.
    #[error("contract violated: {0}")]
    Contract(#[from] ContractViolation),

    /// The mutex could not be acquired before the deadline.
    #[error("timed out acquiring mutex, deadline was {deadline}")]
    Timeout {
        /// The deadline, as read from the mutex's clock.
        deadline: DateTime<Utc>,
    },

    /// Adding a timeout to the current time left the representable range.
    #[error("deadline overflows the clock range")]
    DeadlineOverflow,

    /// A backend name in configuration text was not recognised.
    #[error("unknown mutex backend: {name}")]
    UnknownBackend {
        /// The name that failed to parse.
        name: String,
    },
}

impl SyncError {
    /// Returns `true` if this error is a broken contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, SyncError::Contract(_))
    }

    /// Returns `true` if this error is an expired deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::Timeout { .. })
    }
}

/// Result alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;
