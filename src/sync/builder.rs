use crate::error::SyncError;
use crate::sync::backoff::DEFAULT_SPIN_LIMIT;
use crate::sync::mutex::ClockMutex;
use crate::sync::{MonitorMutex, SpinMutex};
use crate::time::{Clock, SystemClock};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The implementation behind a mutex built by [`MutexBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Blocks on the host scheduler. See [`MonitorMutex`].
    #[default]
    Monitor,

    /// Spins on an atomic word. See [`SpinMutex`].
    Spin,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Monitor => f.write_str("monitor"),
            Backend::Spin => f.write_str("spin"),
        }
    }
}

impl FromStr for Backend {
    type Err = SyncError;

    /// Parses `"monitor"` or `"spin"`, ignoring ASCII case.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case("monitor") {
            Ok(Backend::Monitor)
        } else if name.eq_ignore_ascii_case("spin") {
            Ok(Backend::Spin)
        } else {
            Err(SyncError::UnknownBackend {
                name: name.to_owned(),
            })
        }
    }
}

/// Builder for configuring and creating a mutex.
///
/// # Examples
///
/// ```rust
/// use cadentis_sync::{Backend, FakeClock, MutexBuilder};
/// use chrono::DateTime;
/// use std::sync::Arc;
///
/// let clock = Arc::new(FakeClock::new(DateTime::from_timestamp(0, 0).unwrap()));
///
/// let mutex = MutexBuilder::new()
///     .backend(Backend::Spin)
///     .clock(clock)
///     .spin_limit(16)
///     .build();
/// ```
pub struct MutexBuilder {
    /// Which implementation to build.
    backend: Backend,

    /// Clock that deadlines are evaluated against.
    clock: Arc<dyn Clock>,

    /// Busy spins before yielding, spin backend only.
    spin_limit: u32,
}

impl MutexBuilder {
    /// Creates a builder for a monitor-backed mutex on the system clock.
    pub fn new() -> Self {
        Self {
            backend: Backend::default(),
            clock: Arc::new(SystemClock::new()),
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// Selects the backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Injects the clock that deadlines are read from.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how many times the spin backend spins before yielding.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn spin_limit(mut self, n: u32) -> Self {
        assert!(n > 0, "spin_limit must be > 0");

        self.spin_limit = n;
        self
    }

    /// Builds a monitor-backed mutex, ignoring the selected backend.
    pub fn build_monitor(self) -> MonitorMutex {
        MonitorMutex::new(self.clock)
    }

    /// Builds a spin-backed mutex, ignoring the selected backend.
    pub fn build_spin(self) -> SpinMutex {
        SpinMutex::with_spin_limit(self.clock, self.spin_limit)
    }

    /// Builds a mutex with the selected backend.
    pub fn build(self) -> Arc<dyn ClockMutex> {
        match self.backend {
            Backend::Monitor => Arc::new(self.build_monitor()),
            Backend::Spin => Arc::new(self.build_spin()),
        }
    }
}

impl Default for MutexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexBuilder")
            .field("backend", &self.backend)
            .field("clock", &self.clock)
            .field("spin_limit", &self.spin_limit)
            .finish()
    }
}
