//! Clock and timing utilities for render progress.
//!
//! A render is anchored to a monotonic epoch recorded at encoder launch.
//! This module provides:
//! - The render clock (elapsed milliseconds since launch)
//! - A fixed-interval tick gate for progress presentation

use std::time::Instant;

/// A render clock that provides monotonic elapsed time relative to
/// the moment the encoder was launched.
#[derive(Debug, Clone)]
pub struct RenderClock {
    /// The instant the render started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl RenderClock {
    /// Create a new render clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since the render started.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Seconds elapsed since the render started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at render start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

/// Fixed-interval tick gate.
///
/// The orchestrator polls far more often than it presents progress; this
/// decides which polls also count as a presentation tick.
#[derive(Debug)]
pub struct TickTimer {
    interval_ms: u64,
    last_tick_ms: Option<u64>,
}

impl TickTimer {
    /// Create a timer that fires at most once per `interval_ms`.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_tick_ms: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, now_ms: u64) -> bool {
        match self.last_tick_ms {
            None => {
                self.last_tick_ms = Some(now_ms);
                true
            }
            Some(last) if now_ms.saturating_sub(last) >= self.interval_ms => {
                self.last_tick_ms = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Tick interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = RenderClock::start();
        assert!(clock.elapsed_ms() < 1_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_tick_timer() {
        let mut timer = TickTimer::new(1_000);
        assert!(timer.should_tick(0)); // first tick always fires
        assert!(!timer.should_tick(100));
        assert!(!timer.should_tick(999));
        assert!(timer.should_tick(1_000));
        assert!(!timer.should_tick(1_500));
        assert!(timer.should_tick(2_100));
    }

    #[test]
    fn test_tick_timer_zero_interval_is_clamped() {
        let mut timer = TickTimer::new(0);
        assert_eq!(timer.interval_ms(), 1);
        assert!(timer.should_tick(5));
        assert!(!timer.should_tick(5));
        assert!(timer.should_tick(6));
    }

    #[test]
    fn test_tick_timer_with_unbounded_interval() {
        let mut timer = TickTimer::new(u64::MAX);
        assert!(timer.should_tick(5));
        assert!(!timer.should_tick(10));
        assert!(!timer.should_tick(u64::MAX));
    }
}
