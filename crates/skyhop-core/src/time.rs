//! Time Management
//!
//! Frame timing for the simulation loop:
//! - Per-frame delta and total elapsed simulation time
//! - Stopwatch for measuring how long a frame took

use std::time::{Duration, Instant};

/// Delta time wrapper for type safety
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaTime(pub f64);

impl DeltaTime {
    /// Create a new delta time from seconds
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Get the delta time in seconds
    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// Get the delta time as f32
    pub fn as_secs_f32(&self) -> f32 {
        self.0 as f32
    }
}

impl Default for DeltaTime {
    fn default() -> Self {
        Self(1.0 / 60.0)
    }
}

impl From<Duration> for DeltaTime {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs_f64())
    }
}

/// Frame clock tracking elapsed simulation time.
///
/// Deltas are not clamped: a long frame produces a long delta, and the
/// physics step decides how to subdivide it.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock starting at zero elapsed time
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame. Negative deltas count as zero.
    pub fn advance(&mut self, delta: DeltaTime) -> (DeltaTime, f64) {
        let dt = delta.as_secs().max(0.0);
        self.elapsed += dt;
        self.frame_count += 1;
        (DeltaTime(dt), self.elapsed)
    }

    /// Get the total elapsed time in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Get the frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Wall-clock stopwatch, started on creation
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Time since the stopwatch was created
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
