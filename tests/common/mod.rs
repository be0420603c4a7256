#![allow(dead_code)]

use cadentis_sync::{Backend, ClockMutex, FakeClock, MutexBuilder, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One backend on one kind of clock.
pub struct Case {
    pub name: String,
    pub mutex: Arc<dyn ClockMutex>,
    pub fake: Option<Arc<FakeClock>>,
}

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn case(backend: Backend, fake: bool) -> Case {
    let builder = MutexBuilder::new().backend(backend);

    if fake {
        let clock = Arc::new(FakeClock::new(start()));
        Case {
            name: format!("{backend}/fake"),
            mutex: builder.clock(clock.clone()).build(),
            fake: Some(clock),
        }
    } else {
        Case {
            name: format!("{backend}/system"),
            mutex: builder.clock(Arc::new(SystemClock::new())).build(),
            fake: None,
        }
    }
}

/// Every backend on every kind of clock.
pub fn cases() -> Vec<Case> {
    let mut all = Vec::new();
    for backend in [Backend::Monitor, Backend::Spin] {
        for fake in [false, true] {
            all.push(case(backend, fake));
        }
    }
    all
}
