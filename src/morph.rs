//! The morph state machine.
//!
//! [`MorphController`] owns four buffers of the same length:
//!
//! - `resting` - the shape the field settles on when no morph is running
//! - `source` - snapshot of what was visible when the current morph began
//! - `target` - where the current morph ends
//! - `current` - what the field shows this frame
//!
//! A morph interpolates every particle from `source` to `target` along an
//! eased progress curve. Starting a new morph mid-flight snapshots the
//! partially interpolated `current` as the new source, so the field never
//! jumps. When progress reaches 1 the target becomes the resting shape.
//!
//! ```ignore
//! controller.begin_morph(&torus, 2.0, now);
//! loop {
//!     let frame = controller.advance(clock.elapsed());
//!     upload(frame.positions);
//!     if frame.done { break; }
//! }
//! ```

use crate::buffer::PositionBuffer;
use crate::easing::Ease;
use crate::idle::IdleMotion;

/// What the controller is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MorphPhase {
    /// Settled on the resting buffer since `since`.
    Idle { since: f64 },
    /// Interpolating from `start` for `duration` seconds.
    Morphing { start: f64, duration: f64 },
}

/// Result of one [`MorphController::advance`] call.
#[derive(Debug, Clone, Copy)]
pub struct MorphFrame<'a> {
    pub positions: &'a PositionBuffer,
    /// Linear progress in `[0, 1]`.
    pub progress: f32,
    /// Progress after easing.
    pub eased: f32,
    /// The morph finished on this call (or none was running).
    pub done: bool,
}

/// Linear progress of a morph started at `start`. A non-positive or
/// non-finite duration completes immediately.
pub fn morph_progress(now: f64, start: f64, duration: f64) -> f32 {
    if !duration.is_finite() || duration <= 0.0 {
        return 1.0;
    }
    ((now - start) / duration).clamp(0.0, 1.0) as f32
}

/// `out = source + (target - source) * t` per particle. `t` is clamped;
/// the endpoints copy exactly.
///
/// # Panics
///
/// Panics if the buffers differ in length.
pub fn interpolate_into(source: &PositionBuffer, target: &PositionBuffer, t: f32, out: &mut PositionBuffer) {
    assert_eq!(source.count(), target.count(), "position buffer length mismatch");
    if t <= 0.0 {
        out.copy_from(source);
        return;
    }
    if t >= 1.0 {
        out.copy_from(target);
        return;
    }
    assert_eq!(out.count(), source.count(), "position buffer length mismatch");
    for ((o, s), d) in out
        .points_mut()
        .iter_mut()
        .zip(source.points())
        .zip(target.points())
    {
        *o = *s + (*d - *s) * t;
    }
}

/// Allocating variant of [`interpolate_into`].
pub fn interpolate(source: &PositionBuffer, target: &PositionBuffer, t: f32) -> PositionBuffer {
    let mut out = PositionBuffer::zeroed(source.count());
    interpolate_into(source, target, t, &mut out);
    out
}

/// Idle/Morphing state machine over fixed-size position buffers.
#[derive(Debug, Clone)]
pub struct MorphController {
    resting: PositionBuffer,
    source: PositionBuffer,
    target: PositionBuffer,
    current: PositionBuffer,
    phase: MorphPhase,
    ease: Ease,
}

impl MorphController {
    /// Start idle on `initial`. Every buffer is sized to match it.
    pub fn new(initial: PositionBuffer, now: f64) -> Self {
        Self {
            source: initial.clone(),
            target: initial.clone(),
            current: initial.clone(),
            resting: initial,
            phase: MorphPhase::Idle { since: now },
            ease: Ease::default(),
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Begin morphing from what is visible now toward `target`.
    ///
    /// Supersedes any morph in flight.
    ///
    /// # Panics
    ///
    /// Panics if `target` has a different particle count.
    pub fn begin_morph(&mut self, target: &PositionBuffer, duration: f64, now: f64) {
        let superseded = self.is_morphing();
        self.source.copy_from(&self.current);
        self.target.copy_from(target);
        self.phase = MorphPhase::Morphing { start: now, duration };
        tracing::debug!(duration, superseded, "morph started");
    }

    /// Step the morph to `now`.
    ///
    /// While idle this leaves `current` alone and reports `done`.
    pub fn advance(&mut self, now: f64) -> MorphFrame<'_> {
        let MorphPhase::Morphing { start, duration } = self.phase else {
            return MorphFrame {
                positions: &self.current,
                progress: 1.0,
                eased: 1.0,
                done: true,
            };
        };

        let progress = morph_progress(now, start, duration);
        let eased = self.ease.apply(progress);
        let done = progress >= 1.0;
        if done {
            self.current.copy_from(&self.target);
            self.resting.copy_from(&self.target);
            self.phase = MorphPhase::Idle { since: now };
            tracing::info!("morph settled");
        } else {
            interpolate_into(&self.source, &self.target, eased, &mut self.current);
        }

        MorphFrame {
            positions: &self.current,
            progress,
            eased,
            done,
        }
    }

    /// Idle frame: `current = resting + sway`. Does nothing while morphing.
    pub fn settle(&mut self, idle: &IdleMotion, now: f64) -> &PositionBuffer {
        if let MorphPhase::Idle { since } = self.phase {
            idle.apply(&self.resting, now, now - since, &mut self.current);
        }
        &self.current
    }

    /// Jump straight to `shape` without animating.
    pub fn reset(&mut self, shape: &PositionBuffer, now: f64) {
        self.resting.copy_from(shape);
        self.current.copy_from(shape);
        self.phase = MorphPhase::Idle { since: now };
    }

    #[inline]
    pub fn phase(&self) -> MorphPhase {
        self.phase
    }

    #[inline]
    pub fn is_morphing(&self) -> bool {
        matches!(self.phase, MorphPhase::Morphing { .. })
    }

    /// Linear progress at `now`; 1 while idle.
    pub fn progress(&self, now: f64) -> f32 {
        match self.phase {
            MorphPhase::Idle { .. } => 1.0,
            MorphPhase::Morphing { start, duration } => morph_progress(now, start, duration),
        }
    }

    pub fn ease(&self) -> Ease {
        self.ease
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.current.count()
    }

    pub fn current(&self) -> &PositionBuffer {
        &self.current
    }

    pub fn resting(&self) -> &PositionBuffer {
        &self.resting
    }

    pub fn source(&self) -> &PositionBuffer {
        &self.source
    }

    pub fn target(&self) -> &PositionBuffer {
        &self.target
    }
}
