//! Fixed-period tick scheduling
//!
//! One acquire/process/display cycle runs per tick. The event loop owns a
//! `Ticker` and asks it when to wake and whether a tick is due; the period
//! never adapts to load, late ticks are simply late.

use std::time::{Duration, Instant};

/// Interval between display updates
pub const TICK_PERIOD: Duration = Duration::from_millis(30);

/// How far ahead of the deadline the event loop asks to be woken
const WAKE_EARLY: Duration = Duration::from_micros(1000);

/// Deadline tracker driving the render cadence
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next_tick_at: Instant,
}

impl Ticker {
    /// Create a ticker whose first tick is due immediately
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, Instant::now())
    }

    /// Create a ticker with an explicit first deadline
    pub fn starting_at(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_tick_at: start,
        }
    }

    /// The instant the event loop should wake at, slightly ahead of the
    /// deadline so the final stretch can be spin-waited
    pub fn wake_at(&self) -> Instant {
        self.next_tick_at
            .checked_sub(WAKE_EARLY)
            .unwrap_or(self.next_tick_at)
    }

    /// The exact deadline of the pending tick
    pub fn deadline(&self) -> Instant {
        self.next_tick_at
    }

    /// Whether the pending tick should fire now
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.wake_at()
    }

    /// Schedule the next tick one period after the current deadline
    ///
    /// Falling more than two periods behind resets the schedule relative to
    /// `now` instead of bursting redraws to catch up.
    pub fn advance(&mut self, now: Instant) {
        self.next_tick_at += self.period;

        let max_behind = self.period * 2;
        if now > self.next_tick_at + max_behind {
            self.next_tick_at = now + self.period;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_due_immediately() {
        let start = Instant::now();
        let ticker = Ticker::starting_at(TICK_PERIOD, start);
        assert!(ticker.is_due(start));
    }

    #[test]
    fn test_advance_steps_one_period() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(TICK_PERIOD, start);
        let first = ticker.deadline();

        ticker.advance(start);
        assert_eq!(ticker.deadline(), first + TICK_PERIOD);
        assert!(!ticker.is_due(start));

        ticker.advance(start + TICK_PERIOD);
        assert_eq!(ticker.deadline(), first + 2 * TICK_PERIOD);
    }

    #[test]
    fn test_far_behind_resets_instead_of_bursting() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(TICK_PERIOD, start);

        let late = start + 10 * TICK_PERIOD;
        ticker.advance(late);
        assert_eq!(ticker.deadline(), late + TICK_PERIOD);
    }

    #[test]
    fn test_slightly_behind_keeps_schedule() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(TICK_PERIOD, start);

        // One period late is within the catch-up allowance
        ticker.advance(start + TICK_PERIOD);
        assert_eq!(ticker.deadline(), start + TICK_PERIOD);
    }

    #[test]
    fn test_wake_at_precedes_deadline() {
        let start = Instant::now() + Duration::from_secs(1);
        let ticker = Ticker::starting_at(TICK_PERIOD, start);
        assert!(ticker.wake_at() < ticker.deadline());
    }
}
