//! Precondition and postcondition checks.
//!
//! Checks run synchronously, before any blocking work, and surface as
//! [`SyncError::Contract`] so they stay distinguishable from timeouts.

use crate::error::{ContractViolation, SyncError, SyncResult};

/// Fails with `violation` unless the precondition holds.
#[inline]
pub(crate) fn require(condition: bool, violation: ContractViolation) -> SyncResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SyncError::Contract(violation))
    }
}

/// Fails with `violation` unless the postcondition holds.
///
/// Postconditions failing indicate a bug in this crate rather than in the
/// caller, so they are also caught by a debug assertion.
#[inline]
pub(crate) fn ensure(condition: bool, violation: ContractViolation) -> SyncResult<()> {
    debug_assert!(condition, "postcondition failed: {violation}");
    require(condition, violation)
}
