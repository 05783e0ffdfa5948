use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Tracks simulated time: a monotonic sub-tick counter and elapsed hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    tick: u64,
    elapsed_hours: f64,
}

impl SimClock {
    /// A clock at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock resumed from saved values.
    pub fn resume(tick: u64, elapsed_hours: f64) -> Self {
        Self {
            tick,
            elapsed_hours,
        }
    }

    /// Advance by one sub-tick of `delta_hours`. Returns the new tick number.
    pub fn advance(&mut self, delta_hours: f64) -> u64 {
        self.tick += 1;
        self.elapsed_hours += delta_hours;
        self.tick
    }

    /// Number of sub-ticks run so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Total simulated hours since start.
    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_hours
    }
}

/// Source of real elapsed time for [`crate::SimulationLoop::tick`].
pub trait WallClock {
    /// Seconds of real time since the previous call. The first call returns zero.
    fn elapsed_seconds(&mut self) -> f64;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Default)]
pub struct SystemWallClock {
    last: Option<Instant>,
}

impl SystemWallClock {
    /// A clock that starts measuring on its first call.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WallClock for SystemWallClock {
    fn elapsed_seconds(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = self
            .last
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last = Some(now);
        elapsed
    }
}

/// Hand-driven wall clock for tests and tools.
///
/// Clones share the same pending time, so a caller can keep a handle after
/// passing one into the simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualWallClock {
    pending: Rc<Cell<f64>>,
}

impl ManualWallClock {
    /// A clock with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `seconds` of real time for the next read.
    pub fn advance(&self, seconds: f64) {
        self.pending.set(self.pending.get() + seconds);
    }
}

impl WallClock for ManualWallClock {
    fn elapsed_seconds(&mut self) -> f64 {
        self.pending.replace(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_initial_state() {
        let clock = SimClock::new();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.elapsed_hours(), 0.0);
    }

    #[test]
    fn clock_advance_accumulates() {
        let mut clock = SimClock::new();
        clock.advance(0.25);
        clock.advance(0.25);
        assert_eq!(clock.advance(0.5), 3);
        assert!((clock.elapsed_hours() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn manual_clock_drains_on_read() {
        let handle = ManualWallClock::new();
        let mut clock = handle.clone();
        handle.advance(2.0);
        handle.advance(1.5);
        assert!((clock.elapsed_seconds() - 3.5).abs() < f64::EPSILON);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }

    #[test]
    fn system_clock_first_read_is_zero() {
        let mut clock = SystemWallClock::new();
        assert_eq!(clock.elapsed_seconds(), 0.0);
        assert!(clock.elapsed_seconds() >= 0.0);
    }
}
