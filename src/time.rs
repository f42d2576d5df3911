//! Frame timing for the animation driver.
//!
//! The driver takes plain `f64` seconds so hosts can feed it any clock
//! (`requestAnimationFrame` timestamps, a game loop, a test). [`FrameClock`]
//! is the clock the bundled tools use: wall time by default, or a fixed
//! step per frame for deterministic headless runs.
//!
//! # Example
//!
//! ```ignore
//! use cosmorph::time::FrameClock;
//!
//! let mut clock = FrameClock::stepped(1.0 / 60.0);
//!
//! loop {
//!     let now = clock.tick();
//!     driver.tick(now);
//! }
//! ```

use std::time::Instant;

#[derive(Debug, Clone, Copy)]
enum Source {
    Wall { start: Instant, last: Instant },
    Stepped { step: f64 },
}

/// Time tracking for frame loops.
///
/// Elapsed time is kept in `f64` seconds so long sessions do not lose
/// precision in the idle phase.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    /// Total elapsed seconds, scaled and excluding pauses.
    elapsed: f64,
    /// Seconds advanced by the last tick.
    delta: f64,
    frame_count: u64,
    paused: bool,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f64,
}

impl FrameClock {
    /// Wall-clock timer starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self::with_source(Source::Wall {
            start: now,
            last: now,
        })
    }

    /// Clock that advances exactly `step` seconds per tick.
    pub fn stepped(step: f64) -> Self {
        Self::with_source(Source::Stepped { step: step.max(0.0) })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            elapsed: 0.0,
            delta: 0.0,
            frame_count: 0,
            paused: false,
            time_scale: 1.0,
        }
    }

    /// Advance one frame. Returns the new elapsed time.
    pub fn tick(&mut self) -> f64 {
        let raw = match &mut self.source {
            Source::Wall { last, .. } => {
                let now = Instant::now();
                let d = now.duration_since(*last).as_secs_f64();
                *last = now;
                d
            }
            Source::Stepped { step } => *step,
        };

        self.delta = if self.paused { 0.0 } else { raw * self.time_scale };
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.elapsed
    }

    /// Advance by an explicit amount, regardless of the source.
    pub fn advance_by(&mut self, secs: f64) -> f64 {
        if let Source::Wall { last, .. } = &mut self.source {
            *last = Instant::now();
        }
        self.delta = if self.paused { 0.0 } else { secs.max(0.0) * self.time_scale };
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.elapsed
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Stop time. Ticks still count frames but add no time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    /// Wall seconds since the clock started, ignoring pause and scale.
    /// `None` for stepped clocks.
    pub fn wall_elapsed(&self) -> Option<f64> {
        match self.source {
            Source::Wall { start, .. } => Some(start.elapsed().as_secs_f64()),
            Source::Stepped { .. } => None,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_wall_tick() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let elapsed = clock.tick();
        assert!(elapsed > 0.0);
        assert!(clock.delta() > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_stepped_is_exact() {
        let mut clock = FrameClock::stepped(0.25);
        for _ in 0..8 {
            clock.tick();
        }
        assert_eq!(clock.elapsed(), 2.0);
        assert_eq!(clock.delta(), 0.25);
        assert!(clock.wall_elapsed().is_none());
    }

    #[test]
    fn test_pause() {
        let mut clock = FrameClock::stepped(0.5);
        clock.tick();
        clock.pause();
        clock.tick();
        assert_eq!(clock.elapsed(), 0.5);
        assert_eq!(clock.delta(), 0.0);
        assert_eq!(clock.frame(), 2);
        clock.toggle_pause();
        clock.tick();
        assert_eq!(clock.elapsed(), 1.0);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = FrameClock::stepped(1.0);
        clock.set_time_scale(0.5);
        clock.tick();
        assert_eq!(clock.elapsed(), 0.5);

        // Negative scale should clamp to 0
        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
        clock.advance_by(3.0);
        assert_eq!(clock.elapsed(), 0.5);
    }
}
