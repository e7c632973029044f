use std::time::{Duration, Instant};

/// Source of elapsed time for the search budget.
pub trait Clock: Send {
    /// Time since the clock was (re)started.
    fn elapsed(&self) -> Duration;

    fn restart(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn restart(&mut self) {
        self.start = Instant::now();
    }
}
