//! Frame-driven timers. Time only moves when the owner calls `tick`, which
//! keeps every timed effect deterministic under simulated clocks.

use std::time::Duration;

/// Repeating timer firing once per `period`.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    elapsed: Duration,
    active: bool,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self { period, elapsed: Duration::ZERO, active: true }
    }

    /// Advances the timer and returns how many periods completed.
    pub fn tick(&mut self, dt: Duration) -> u32 {
        if !self.active || self.period.is_zero() {
            return 0;
        }
        self.elapsed += dt;
        let mut fired = 0;
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
            fired += 1;
        }
        fired
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.elapsed = Duration::ZERO;
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// One-shot timer. Arming an armed timeout restarts it.
#[derive(Debug, Clone)]
pub struct Timeout {
    duration: Duration,
    remaining: Option<Duration>,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration, remaining: None }
    }

    pub fn arm(&mut self) {
        self.remaining = Some(self.duration);
    }

    /// Returns true on the tick the timeout expires.
    pub fn tick(&mut self, dt: Duration) -> bool {
        match self.remaining {
            Some(remaining) if dt >= remaining => {
                self.remaining = None;
                true
            }
            Some(remaining) => {
                self.remaining = Some(remaining - dt);
                false
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    #[cfg(test)]
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }
}
