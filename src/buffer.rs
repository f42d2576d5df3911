//! Fixed-capacity particle buffers.
//!
//! Every buffer is sized once for the session's particle count and then
//! rewritten in place. Points are stored as [`Vec3`] and exposed to
//! renderers as flat `f32` slices (`3 * count` values, particle `i` at
//! `3i..3i+2`) or raw bytes, both via `bytemuck` casts with no copy.
//!
//! ```ignore
//! let mut field = ParticleField::new(10_000, [0.02, 0.08], &mut rng);
//! queue.write_buffer(&positions_gpu, 0, field.positions().as_bytes());
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

/// Positions of `N` particles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionBuffer {
    points: Vec<Vec3>,
}

impl PositionBuffer {
    /// Buffer of `count` particles, all at the origin.
    pub fn zeroed(count: usize) -> Self {
        Self {
            points: vec![Vec3::ZERO; count],
        }
    }

    /// Build a buffer from existing points.
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Build a buffer from a flat `[x0, y0, z0, x1, ...]` slice.
    ///
    /// # Panics
    ///
    /// Panics if `flat.len()` is not a multiple of 3.
    pub fn from_flat(flat: &[f32]) -> Self {
        assert!(
            flat.len() % 3 == 0,
            "flat position data must hold 3 values per particle, got {}",
            flat.len()
        );
        Self {
            points: flat
                .chunks_exact(3)
                .map(|c| Vec3::new(c[0], c[1], c[2]))
                .collect(),
        }
    }

    /// Number of particles.
    #[inline]
    pub fn count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut [Vec3] {
        &mut self.points
    }

    /// Flat view, length `3 * count`.
    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.points)
    }

    #[inline]
    pub fn as_flat_mut(&mut self) -> &mut [f32] {
        bytemuck::cast_slice_mut(&mut self.points)
    }

    /// Raw bytes for GPU upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }

    /// Overwrite this buffer with `other` without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if the particle counts differ. Mismatched buffers mean the
    /// particle count changed without the buffers being rebuilt.
    pub fn copy_from(&mut self, other: &PositionBuffer) {
        assert_eq!(
            self.count(),
            other.count(),
            "position buffer length mismatch"
        );
        self.points.copy_from_slice(&other.points);
    }

    /// Largest distance of any particle from the origin.
    pub fn max_radius(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.length())
            .fold(0.0, f32::max)
    }

    /// Axis-aligned bounds `(min, max)`, or `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }
}

/// Per-particle RGB colors, channels in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorBuffer {
    colors: Vec<Vec3>,
}

impl ColorBuffer {
    /// Every particle set to `color`.
    pub fn filled(count: usize, color: Vec3) -> Self {
        Self {
            colors: vec![color; count],
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    #[inline]
    pub fn colors_mut(&mut self) -> &mut [Vec3] {
        &mut self.colors
    }

    /// Flat view, length `3 * count`.
    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Overwrite with `other` in place.
    ///
    /// # Panics
    ///
    /// Panics if the particle counts differ.
    pub fn copy_from(&mut self, other: &ColorBuffer) {
        assert_eq!(self.count(), other.count(), "color buffer length mismatch");
        self.colors.copy_from_slice(&other.colors);
    }
}

/// Per-particle point sizes. Assigned once when the field is created.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeBuffer {
    sizes: Vec<f32>,
    range: [f32; 2],
}

impl SizeBuffer {
    /// Uniformly random sizes in `range` (`[min, max]`).
    pub fn random<R: Rng + ?Sized>(count: usize, range: [f32; 2], rng: &mut R) -> Self {
        let [min, max] = range;
        let sizes = (0..count)
            .map(|_| min + rng.gen::<f32>() * (max - min))
            .collect();
        Self { sizes, range }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// The `[min, max]` range the sizes were drawn from.
    #[inline]
    pub fn range(&self) -> [f32; 2] {
        self.range
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sizes)
    }
}

/// Interleaved per-particle vertex for hosts that upload one buffer.
///
/// 32 bytes with no padding, matching a std430 struct of `vec3 + f32,
/// vec3 + f32`, so it can back a WGSL/GLSL storage buffer directly.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

/// The render-buffer triple for one particle field.
///
/// Owned by the [`AnimationDriver`](crate::AnimationDriver); the driver
/// overwrites positions every frame and colors on theme changes. Sizes
/// never change after creation.
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: PositionBuffer,
    colors: ColorBuffer,
    sizes: SizeBuffer,
}

impl ParticleField {
    /// Allocate all three buffers for `count` particles. Colors start white.
    pub fn new<R: Rng + ?Sized>(count: usize, size_range: [f32; 2], rng: &mut R) -> Self {
        Self {
            positions: PositionBuffer::zeroed(count),
            colors: ColorBuffer::filled(count, Vec3::ONE),
            sizes: SizeBuffer::random(count, size_range, rng),
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.positions.count()
    }

    #[inline]
    pub fn positions(&self) -> &PositionBuffer {
        &self.positions
    }

    #[inline]
    pub fn colors(&self) -> &ColorBuffer {
        &self.colors
    }

    #[inline]
    pub fn sizes(&self) -> &SizeBuffer {
        &self.sizes
    }

    #[inline]
    pub(crate) fn positions_mut(&mut self) -> &mut PositionBuffer {
        &mut self.positions
    }

    #[inline]
    pub(crate) fn colors_mut(&mut self) -> &mut ColorBuffer {
        &mut self.colors
    }

    /// Write the field into an interleaved vertex slice.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the particle count.
    pub fn interleave_into(&self, out: &mut [ParticleVertex]) {
        assert_eq!(out.len(), self.count(), "vertex slice length mismatch");
        for (i, v) in out.iter_mut().enumerate() {
            v.position = self.positions.points[i].to_array();
            v.size = self.sizes.sizes[i];
            v.color = self.colors.colors[i].to_array();
        }
    }
}
