//! Clocks used to evaluate deadlines.
//!
//! Every mutex and condition reads "now" from an injected [`Clock`] rather
//! than from the host directly. This module provides:
//! - [`SystemClock`], backed by the host wall clock,
//! - [`FakeClock`], a manually advanced clock for deterministic tests.

mod clock;
mod fake;

#[doc(inline)]
pub use clock::{Clock, SystemClock};

#[doc(inline)]
pub use fake::FakeClock;

pub(crate) use clock::{deadline_after, remaining};
