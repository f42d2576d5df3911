//! Ease curves for morph progress.
//!
//! All curves map `[0, 1]` onto `[0, 1]`, are monotonic, and hit both
//! endpoints exactly. Inputs outside the unit interval are clamped.

use serde::{Deserialize, Serialize};

/// Reparameterization applied to linear morph progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    /// `4t³` below one half, `1 - (-2t + 2)³ / 2` above.
    #[default]
    InOutCubic,
    /// Fast start that settles exponentially.
    OutExpo,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InOutCubic => ease_in_out_cubic(t),
            Ease::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
        }
    }
}

#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
