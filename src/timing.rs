//! Frame timing: injectable clock and per-loop delta tracking.

use std::time::Instant;

/// Source of frame timestamps in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Remembers the last frame timestamp a loop has seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimer {
    last_ms: Option<f64>,
}

impl FrameTimer {
    /// Milliseconds since the previous call. The first frame and clocks that
    /// step backwards yield 0.
    pub fn delta(&mut self, now_ms: f64) -> f64 {
        let dt = self.last_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_ms = Some(now_ms);
        dt
    }

    /// Move the baseline to `now_ms` so time before it is never attributed.
    pub fn reanchor(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
    }
}
