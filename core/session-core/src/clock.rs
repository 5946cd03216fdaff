//! Time source for the lifecycle.
//!
//! Everything in the core reads time through [`Clock`] so tests and the
//! `simulate` command can step time deterministically.

use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;

pub const MS_PER_SEC: i64 = 1_000;
pub const MS_PER_MINUTE: i64 = 60 * MS_PER_SEC;

/// Milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep a handle while the
/// lifecycle owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * MS_PER_SEC);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance_ms(minutes * MS_PER_MINUTE);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}
