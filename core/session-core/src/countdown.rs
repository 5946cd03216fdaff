//! The numeric countdown shown while the session is in `Warning`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Remaining(u32),
    Elapsed,
}

#[derive(Debug)]
pub struct WarningCountdown {
    start_secs: u32,
    remaining: Option<u32>,
}

impl WarningCountdown {
    pub fn new(start_secs: u32) -> Self {
        Self {
            start_secs: start_secs.max(1),
            remaining: None,
        }
    }

    /// (Re)starts from the full duration and returns it.
    pub fn start(&mut self) -> u32 {
        self.remaining = Some(self.start_secs);
        self.start_secs
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// One second passes. `None` when the countdown isn't running; after
    /// `Elapsed` it stops itself.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        let remaining = self.remaining?;
        if remaining <= 1 {
            self.remaining = None;
            return Some(CountdownTick::Elapsed);
        }
        self.remaining = Some(remaining - 1);
        Some(CountdownTick::Remaining(remaining - 1))
    }
}
