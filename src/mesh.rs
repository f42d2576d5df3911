//! Reference meshes for solid shapes.
//!
//! A reference mesh is only a vertex cloud: the sampler picks random
//! vertices and jitters them, so faces and edges are never stored. Each
//! constructor mirrors the vertex layout of a conventional indexed mesh
//! generator (UV sphere grid, torus grid), which means vertex density is
//! not uniform over the surface (UV spheres crowd the poles). That density
//! is part of the look.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Upper bound on octahedron face subdivisions.
pub const MAX_OCTAHEDRON_DETAIL: u32 = 1024;

/// Vertex cloud a solid shape is resampled from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceMesh {
    pub vertices: Vec<Vec3>,
}

impl ReferenceMesh {
    /// UV sphere grid with `(width_segments + 1) * (height_segments + 1)` vertices.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);

        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            let theta = v * PI;
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let phi = u * TAU;
                vertices.push(Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }

        Self { vertices }
    }

    /// Torus around the Z axis.
    ///
    /// * `radius` - Distance from the center to the middle of the tube
    /// * `tube` - Tube radius
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(2);
        let tubular = tubular_segments.max(3);
        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let ring = radius + tube * v.cos();
                vertices.push(Vec3::new(ring * u.cos(), ring * u.sin(), tube * v.sin()));
            }
        }

        Self { vertices }
    }

    /// Octahedron with flat faces subdivided into a triangular lattice.
    ///
    /// `detail = 1` gives only the six corner vertices (each repeated once
    /// per adjacent face); higher values spread vertices over the faces.
    /// `detail` is clamped to [`MAX_OCTAHEDRON_DETAIL`].
    pub fn octahedron(radius: f32, detail: u32) -> Self {
        let d = detail.clamp(1, MAX_OCTAHEDRON_DETAIL);
        let px = Vec3::X * radius;
        let nx = Vec3::NEG_X * radius;
        let py = Vec3::Y * radius;
        let ny = Vec3::NEG_Y * radius;
        let pz = Vec3::Z * radius;
        let nz = Vec3::NEG_Z * radius;

        let faces = [
            (py, px, pz),
            (py, pz, nx),
            (py, nx, nz),
            (py, nz, px),
            (ny, pz, px),
            (ny, nx, pz),
            (ny, nz, nx),
            (ny, px, nz),
        ];

        let per_face = (d as usize + 1) * (d as usize + 2) / 2;
        let mut vertices = Vec::with_capacity(faces.len() * per_face);
        for (a, b, c) in faces {
            for i in 0..=d {
                for j in 0..=(d - i) {
                    let s = i as f32 / d as f32;
                    let t = j as f32 / d as f32;
                    vertices.push(a + (b - a) * s + (c - a) * t);
                }
            }
        }

        Self { vertices }
    }

    /// Stylized ship: a spiral cone for the hull plus two wing spars.
    ///
    /// * `height` - Hull length along Y
    /// * `width` - Hull base radius; wings span `2 * width` on each side
    pub fn spaceship(height: f32, width: f32) -> Self {
        const HULL: u32 = 100;
        const WING: u32 = 50;
        let mut vertices = Vec::with_capacity((HULL + 2 * WING) as usize);

        for i in 0..HULL {
            let t = i as f32 / HULL as f32;
            let angle = t * TAU;
            let r = (1.0 - t) * width;
            vertices.push(Vec3::new(angle.cos() * r, t * height - height / 2.0, angle.sin() * r));
        }

        let wing_y = -height * 0.3;
        for i in 0..WING {
            let t = i as f32 / WING as f32;
            vertices.push(Vec3::new(-width * 2.0 * t, wing_y, 0.0));
            vertices.push(Vec3::new(width * 2.0 * t, wing_y, 0.0));
        }

        Self { vertices }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_sphere_vertices_on_surface() {
        let mesh = ReferenceMesh::uv_sphere(6.0, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
        for v in &mesh.vertices {
            assert!((v.length() - 6.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_torus_tube_distance() {
        let (radius, tube) = (6.0, 2.0);
        let mesh = ReferenceMesh::torus(radius, tube, 32, 64);
        assert_eq!(mesh.vertex_count(), 33 * 65);
        for v in &mesh.vertices {
            let ring = Vec3::new(v.x, v.y, 0.0).normalize() * radius;
            assert!(((*v - ring).length() - tube).abs() < 1e-3);
        }
    }

    #[test]
    fn test_octahedron_faces_lie_on_l1_sphere() {
        let mesh = ReferenceMesh::octahedron(4.0, 8);
        assert_eq!(mesh.vertex_count(), 8 * 45);
        for v in &mesh.vertices {
            let l1 = v.x.abs() + v.y.abs() + v.z.abs();
            assert!((l1 - 4.0).abs() < 1e-3, "vertex {v:?} off the faces");
        }
    }

    #[test]
    fn test_octahedron_detail_is_clamped() {
        let mesh = ReferenceMesh::octahedron(1.0, 70_000);
        assert_eq!(mesh.vertex_count(), 8 * 1025 * 1026 / 2);
    }

    #[test]
    fn test_spaceship_layout() {
        let mesh = ReferenceMesh::spaceship(8.0, 4.0);
        assert_eq!(mesh.vertex_count(), 200);
        // Hull base sits at -height/2 with full width
        assert!((mesh.vertices[0] - Vec3::new(4.0, -4.0, 0.0)).length() < 1e-5);
        // Wings are flat at y = -0.3 * height
        assert!(mesh.vertices[100..].iter().all(|v| (v.y + 2.4).abs() < 1e-5 && v.z == 0.0));
    }
}
