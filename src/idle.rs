//! Idle sway for a settled field.
//!
//! Each particle bobs along Y on a sine wave whose phase shifts with its
//! index, which reads as a slow ripple through the cloud. The offset is a
//! pure function of absolute time applied on top of the resting buffer, so
//! it never accumulates and stays within `amplitude` indefinitely.

use crate::buffer::PositionBuffer;

/// Parameters of the idle sway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleMotion {
    /// Peak Y offset in world units.
    pub amplitude: f32,
    /// Phase difference between neighbouring particles, in radians.
    pub phase_step: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
    /// Seconds over which the sway fades in after a morph settles.
    /// Zero starts at full amplitude.
    pub ramp: f32,
}

impl Default for IdleMotion {
    fn default() -> Self {
        Self {
            amplitude: 0.05,
            phase_step: 0.01,
            speed: 1.0,
            ramp: 0.5,
        }
    }
}

impl IdleMotion {
    /// Motion that leaves the resting buffer untouched.
    pub const STILL: IdleMotion = IdleMotion {
        amplitude: 0.0,
        phase_step: 0.0,
        speed: 0.0,
        ramp: 0.0,
    };

    /// Y offset of particle `index` at `elapsed` seconds, before ramping.
    ///
    /// Phase is computed in `f64` so long sessions keep full precision.
    #[inline]
    pub fn offset(&self, index: usize, elapsed: f64) -> f32 {
        let phase = elapsed * self.speed as f64 + index as f64 * self.phase_step as f64;
        (phase.sin() as f32) * self.amplitude
    }

    /// Fade-in factor in `[0, 1]`, `since_settled` seconds after settling.
    #[inline]
    pub fn ramp_factor(&self, since_settled: f64) -> f32 {
        if self.ramp <= 0.0 || !since_settled.is_finite() {
            return 1.0;
        }
        (since_settled / self.ramp as f64).clamp(0.0, 1.0) as f32
    }

    /// Write `resting` plus the sway into `out`.
    ///
    /// # Panics
    ///
    /// Panics if the buffers differ in length.
    pub fn apply(&self, resting: &PositionBuffer, elapsed: f64, since_settled: f64, out: &mut PositionBuffer) {
        out.copy_from(resting);
        if self.amplitude == 0.0 {
            return;
        }
        let ramp = self.ramp_factor(since_settled);
        for (i, p) in out.points_mut().iter_mut().enumerate() {
            p.y += self.offset(i, elapsed) * ramp;
        }
    }
}
