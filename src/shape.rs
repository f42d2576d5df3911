//! Shape sampling.
//!
//! A [`ShapeRequest`] names a target form; the [`ShapeSampler`] turns it
//! into exactly `count` points. Placement is random, the shape is not:
//! two samples of the same request differ point by point but fill the
//! same volume or surface.
//!
//! | Request | Method |
//! |---------|--------|
//! | [`ShapeRequest::Sphere`] | uniform in the ball (cube-root radius) |
//! | [`ShapeRequest::Solid`] | resample a [`ReferenceMesh`] with jitter |
//! | [`ShapeRequest::Text`] | extruded glyph outlines, resampled |
//! | [`ShapeRequest::Cluster`] | clumps around random centers |
//!
//! Geometric shapes are fast enough to sample on the frame thread. Text
//! loads a font and should go through [`ShapeSampler::spawn`].

use crate::buffer::PositionBuffer;
use crate::error::SampleError;
use crate::font::FontLibrary;
use crate::mesh::ReferenceMesh;
use crate::task::{RequestId, SampleTask};
use crate::text::{text_mesh, TextOptions};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use tracing::debug;

/// Parametric solids sampled from a reference mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solid {
    Sphere { radius: f32 },
    Torus { radius: f32, tube: f32 },
    /// The "crystal".
    Octahedron { radius: f32 },
    /// A thin torus.
    Ring { radius: f32, tube: f32 },
    Spaceship { height: f32, width: f32 },
    /// Clustered star field; sampled like [`ShapeRequest::Cluster`].
    Stars { spread: f32 },
}

impl Solid {
    /// Sphere with the default radius.
    pub const SPHERE: Solid = Solid::Sphere { radius: 6.0 };
    /// Torus with the default proportions.
    pub const TORUS: Solid = Solid::Torus {
        radius: 6.0,
        tube: 2.0,
    };
    pub const RING: Solid = Solid::Ring {
        radius: 8.0,
        tube: 0.6,
    };
    pub const SPACESHIP: Solid = Solid::Spaceship {
        height: 8.0,
        width: 4.0,
    };
    pub const STARS: Solid = Solid::Stars { spread: 15.0 };

    /// Reference mesh for this solid, `None` for [`Solid::Stars`].
    pub fn mesh(&self, octahedron_detail: u32) -> Option<ReferenceMesh> {
        Some(match *self {
            Solid::Sphere { radius } => ReferenceMesh::uv_sphere(radius, 64, 64),
            Solid::Torus { radius, tube } => ReferenceMesh::torus(radius, tube, 32, 64),
            Solid::Octahedron { radius } => ReferenceMesh::octahedron(radius, octahedron_detail),
            Solid::Ring { radius, tube } => ReferenceMesh::torus(radius, tube, 16, 100),
            Solid::Spaceship { height, width } => ReferenceMesh::spaceship(height, width),
            Solid::Stars { .. } => return None,
        })
    }
}

/// A target form for the particle field.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRequest {
    /// Points uniformly distributed inside a ball.
    Sphere { radius: f32 },
    /// Extruded text in the configured font.
    Text { content: String },
    Solid(Solid),
    /// Clumpy star field in a cube of side `spread`.
    Cluster { spread: f32 },
}

impl ShapeRequest {
    /// Whether sampling needs I/O and belongs on a worker thread.
    pub fn is_async(&self) -> bool {
        matches!(self, ShapeRequest::Text { .. })
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ShapeRequest::Sphere { .. } => "sphere",
            ShapeRequest::Text { .. } => "text",
            ShapeRequest::Solid(Solid::Sphere { .. }) => "solid-sphere",
            ShapeRequest::Solid(Solid::Torus { .. }) => "torus",
            ShapeRequest::Solid(Solid::Octahedron { .. }) => "octahedron",
            ShapeRequest::Solid(Solid::Ring { .. }) => "ring",
            ShapeRequest::Solid(Solid::Spaceship { .. }) => "spaceship",
            ShapeRequest::Solid(Solid::Stars { .. }) => "stars",
            ShapeRequest::Cluster { .. } => "cluster",
        }
    }
}

/// Tunables shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSettings {
    /// Full width of the per-axis jitter added to resampled vertices.
    pub jitter: f32,
    /// Number of clump centers in a cluster.
    pub cluster_count: usize,
    /// Full width of the per-axis offset around a clump center.
    pub local_spread: f32,
    pub octahedron_detail: u32,
    pub text: TextOptions,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            jitter: 0.2,
            cluster_count: 48,
            local_spread: 3.0,
            octahedron_detail: 16,
            text: TextOptions::default(),
        }
    }
}

/// Fill `out` with points uniformly distributed inside a ball.
pub fn sample_sphere_into<R: Rng + ?Sized>(radius: f32, out: &mut [Vec3], rng: &mut R) {
    for p in out.iter_mut() {
        let theta = rng.gen::<f32>() * TAU;
        let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
        let r = radius * rng.gen::<f32>().cbrt();
        *p = Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        );
    }
}

/// Fill `out` with clumps around `centers` random centers in a cube of side `spread`.
pub fn sample_cluster_into<R: Rng + ?Sized>(
    spread: f32,
    centers: usize,
    local_spread: f32,
    out: &mut [Vec3],
    rng: &mut R,
) {
    let centers: Vec<Vec3> = (0..centers.clamp(1, out.len().max(1)))
        .map(|_| (random_unit_cube(rng) - Vec3::splat(0.5)) * spread)
        .collect();
    for p in out.iter_mut() {
        let center = centers[rng.gen_range(0..centers.len())];
        *p = center + (random_unit_cube(rng) - Vec3::splat(0.5)) * local_spread;
    }
}

/// Fill `out` with random vertices of `mesh`, each jittered per axis by
/// `(U(0,1) - 0.5) * jitter`. An empty mesh yields jitter around the origin.
pub fn resample_into<R: Rng + ?Sized>(
    mesh: &ReferenceMesh,
    jitter: f32,
    out: &mut [Vec3],
    rng: &mut R,
) {
    let verts = &mesh.vertices;
    for p in out.iter_mut() {
        let base = if verts.is_empty() {
            Vec3::ZERO
        } else {
            verts[rng.gen_range(0..verts.len())]
        };
        *p = base + (random_unit_cube(rng) - Vec3::splat(0.5)) * jitter;
    }
}

#[inline]
fn random_unit_cube<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(rng.gen(), rng.gen(), rng.gen())
}

/// Turns shape requests into position buffers.
#[derive(Debug, Clone)]
pub struct ShapeSampler {
    settings: SamplerSettings,
    fonts: FontLibrary,
}

impl ShapeSampler {
    pub fn new(settings: SamplerSettings, fonts: FontLibrary) -> Self {
        Self { settings, fonts }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Sample `count` points of `request` into a fresh buffer.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        request: &ShapeRequest,
        count: usize,
        rng: &mut R,
    ) -> Result<PositionBuffer, SampleError> {
        let mut out = PositionBuffer::zeroed(count);
        self.sample_into(request, &mut out, rng)?;
        Ok(out)
    }

    /// Sample into an existing buffer, keeping its length.
    ///
    /// On error `out` is left untouched.
    pub fn sample_into<R: Rng + ?Sized>(
        &self,
        request: &ShapeRequest,
        out: &mut PositionBuffer,
        rng: &mut R,
    ) -> Result<(), SampleError> {
        let s = &self.settings;
        match request {
            ShapeRequest::Sphere { radius } => sample_sphere_into(*radius, out.points_mut(), rng),
            ShapeRequest::Cluster { spread }
            | ShapeRequest::Solid(Solid::Stars { spread }) => {
                sample_cluster_into(*spread, s.cluster_count, s.local_spread, out.points_mut(), rng)
            }
            ShapeRequest::Solid(solid) => {
                if let Some(mesh) = solid.mesh(s.octahedron_detail) {
                    resample_into(&mesh, s.jitter, out.points_mut(), rng);
                }
            }
            ShapeRequest::Text { content } => {
                let font = self.fonts.load(&s.text.font_url)?;
                let mesh = text_mesh(&font, content, &s.text);
                resample_into(&mesh, s.jitter, out.points_mut(), rng);
            }
        }
        debug!(shape = request.kind(), count = out.count(), "sampled shape");
        Ok(())
    }

    /// Sample on a worker thread.
    ///
    /// The worker owns a clone of this sampler and a `SmallRng` seeded with
    /// `seed`, so results are reproducible for a given seed.
    pub fn spawn(&self, id: RequestId, request: ShapeRequest, count: usize, seed: u64) -> SampleTask {
        let sampler = self.clone();
        SampleTask::spawn(id, move |completer| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut out = PositionBuffer::zeroed(count);
            if completer.is_cancelled() {
                return Err(SampleError::Cancelled);
            }
            sampler.sample_into(&request, &mut out, &mut rng)?;
            Ok(out)
        })
    }
}

impl Default for ShapeSampler {
    fn default() -> Self {
        Self::new(SamplerSettings::default(), FontLibrary::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::TINY_FONT;
    use crate::font::MemoryFetcher;
    use std::sync::Arc;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn sampler_with_font() -> ShapeSampler {
        let settings = SamplerSettings {
            text: TextOptions {
                font_url: "tiny".into(),
                ..TextOptions::default()
            },
            ..SamplerSettings::default()
        };
        let fonts = FontLibrary::new(Arc::new(MemoryFetcher::new().with("tiny", TINY_FONT)));
        ShapeSampler::new(settings, fonts)
    }

    #[test]
    fn test_exact_count_for_every_shape() {
        let sampler = sampler_with_font();
        let requests = [
            ShapeRequest::Sphere { radius: 8.0 },
            ShapeRequest::Text {
                content: "A?".into(),
            },
            ShapeRequest::Solid(Solid::SPHERE),
            ShapeRequest::Solid(Solid::TORUS),
            ShapeRequest::Solid(Solid::Octahedron { radius: 4.0 }),
            ShapeRequest::Solid(Solid::RING),
            ShapeRequest::Solid(Solid::SPACESHIP),
            ShapeRequest::Solid(Solid::STARS),
            ShapeRequest::Cluster { spread: 15.0 },
        ];
        for req in &requests {
            for n in [0, 1, 257] {
                let buf = sampler.sample(req, n, &mut rng()).unwrap();
                assert_eq!(buf.as_flat().len(), 3 * n, "{}", req.kind());
                assert!(buf.points().iter().all(|p| p.is_finite()));
            }
        }
    }

    #[test]
    fn test_sphere_within_radius() {
        let mut pts = vec![Vec3::ZERO; 5000];
        sample_sphere_into(3.0, &mut pts, &mut rng());
        assert!(pts.iter().all(|p| p.length() <= 3.0 + 1e-4));
    }

    #[test]
    fn test_resample_stays_near_mesh() {
        let mesh = ReferenceMesh::uv_sphere(6.0, 64, 64);
        let mut pts = vec![Vec3::ZERO; 2000];
        resample_into(&mesh, 0.2, &mut pts, &mut rng());
        // Jitter is at most 0.1 per axis
        let slack = 0.1 * 3f32.sqrt() + 1e-4;
        assert!(pts.iter().all(|p| (p.length() - 6.0).abs() <= slack));
    }

    #[test]
    fn test_resample_empty_mesh_is_jitter_around_origin() {
        let mut pts = vec![Vec3::ONE; 100];
        resample_into(&ReferenceMesh::default(), 0.2, &mut pts, &mut rng());
        assert!(pts.iter().all(|p| p.abs().max_element() <= 0.1));
    }

    #[test]
    fn test_cluster_within_bounds() {
        let mut pts = vec![Vec3::ZERO; 3000];
        sample_cluster_into(15.0, 48, 3.0, &mut pts, &mut rng());
        assert!(pts.iter().all(|p| p.abs().max_element() <= 7.5 + 1.5));
    }

    #[test]
    fn test_cluster_huge_center_count() {
        let mut pts = vec![Vec3::ZERO; 10];
        sample_cluster_into(15.0, usize::MAX, 3.0, &mut pts, &mut rng());
        assert!(pts.iter().all(|p| p.abs().max_element() <= 7.5 + 1.5));
    }

    #[test]
    fn test_text_without_font_fails() {
        let sampler = ShapeSampler::new(
            SamplerSettings::default(),
            FontLibrary::new(Arc::new(MemoryFetcher::new())),
        );
        let req = ShapeRequest::Text {
            content: "HI".into(),
        };
        let mut out = PositionBuffer::zeroed(10);
        let err = sampler.sample_into(&req, &mut out, &mut rng()).unwrap_err();
        assert!(matches!(err, SampleError::Font(_)));
        assert_eq!(out, PositionBuffer::zeroed(10));
    }

    #[test]
    fn test_spawn_is_seed_deterministic() {
        let sampler = sampler_with_font();
        let req = ShapeRequest::Text {
            content: "AA".into(),
        };
        let a = pollster::block_on(sampler.spawn(RequestId(1), req.clone(), 500, 9)).unwrap();
        let b = pollster::block_on(sampler.spawn(RequestId(2), req, 500, 9)).unwrap();
        assert_eq!(a, b);
    }
}
