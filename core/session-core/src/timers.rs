//! Cancellable timer table.
//!
//! The lifecycle never sleeps. It arms timers here and a driver (the CLI
//! event loop, or a test stepping a [`crate::ManualClock`]) asks for whatever
//! is due. Ticks are reported at their scheduled instant, not at the time
//! the driver got around to asking, so a clock that jumps forward replays
//! every missed tick in order.

use std::collections::BTreeMap;

/// Timers the lifecycle can arm. Ordering breaks ties between timers due
/// at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Inactivity sampling tick.
    Monitor,
    /// One-second warning countdown.
    Countdown,
    /// One-shot logout after the verification flow completes.
    Farewell,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due_at: i64,
    /// `None` for one-shot timers.
    interval_ms: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Timers {
    armed: BTreeMap<TimerKind, Timer>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a repeating timer whose first tick is one interval after `now`.
    /// Re-arming replaces the previous schedule.
    pub fn arm(&mut self, kind: TimerKind, now: i64, interval_ms: i64) {
        let interval_ms = interval_ms.max(1);
        self.armed.insert(
            kind,
            Timer {
                due_at: now + interval_ms,
                interval_ms: Some(interval_ms),
            },
        );
    }

    /// Arms a timer that fires once, `delay_ms` after `now`.
    pub fn arm_once(&mut self, kind: TimerKind, now: i64, delay_ms: i64) {
        self.armed.insert(
            kind,
            Timer {
                due_at: now + delay_ms.max(0),
                interval_ms: None,
            },
        );
    }

    /// Returns whether a timer was actually armed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.armed.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Earliest pending tick.
    pub fn next_due(&self) -> Option<(i64, TimerKind)> {
        self.armed
            .iter()
            .map(|(kind, timer)| (timer.due_at, *kind))
            .min()
    }

    /// Takes the earliest tick due at or before `now`, rescheduling repeating
    /// timers and dropping one-shot ones.
    pub fn pop_due(&mut self, now: i64) -> Option<(i64, TimerKind)> {
        let (due_at, kind) = self.next_due().filter(|(due_at, _)| *due_at <= now)?;

        match self.armed.get_mut(&kind) {
            Some(Timer {
                due_at: next,
                interval_ms: Some(interval),
            }) => *next += *interval,
            _ => {
                self.armed.remove(&kind);
            }
        }

        Some((due_at, kind))
    }
}
