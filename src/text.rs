//! Extruded text meshes.
//!
//! Text is laid out glyph by glyph from a [`TypefaceFont`], each outline is
//! flattened into polygons, and the polygons are extruded into a bevelled
//! slab. The result is a vertex cloud on the outline walls of the letters,
//! centered on its bounding box, ready to be resampled like any other
//! [`ReferenceMesh`].
//!
//! Letter faces carry no interior points: a triangulated cap reuses the
//! contour vertices, so the vertex cloud of a solid letter is its outline.

use crate::font::TypefaceFont;
use crate::mesh::ReferenceMesh;
use glam::{Vec2, Vec3};
use kurbo::{Affine, CubicBez, ParamCurve, PathEl, Point, QuadBez};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, warn};

/// Layout and extrusion parameters for text shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Font resource handed to the [`FontFetcher`](crate::font::FontFetcher).
    pub font_url: String,
    /// Em size in world units.
    pub size: f32,
    /// Extrusion depth along +Z.
    pub depth: f32,
    /// Subdivisions per quadratic/cubic outline segment.
    pub curve_segments: u32,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    /// Bevel rings on each face. Zero disables bevelling.
    pub bevel_segments: u32,
    /// Maximum spacing between vertices along straight edges and the depth.
    pub edge_spacing: f32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_url: "fonts/helvetiker_regular.typeface.json".to_string(),
            size: 4.0,
            depth: 0.5,
            curve_segments: 12,
            bevel_thickness: 0.1,
            bevel_size: 0.05,
            bevel_segments: 5,
            edge_spacing: 0.25,
        }
    }
}

/// A closed polygon of one glyph.
#[derive(Debug, Clone)]
struct Contour {
    points: Vec<Vec2>,
    hole: bool,
}

/// Build the extruded vertex cloud for `content`.
///
/// Empty content (or content made only of whitespace and glyphs the font
/// cannot render) gives an empty mesh.
pub fn text_mesh(font: &TypefaceFont, content: &str, opts: &TextOptions) -> ReferenceMesh {
    let scale = (opts.size / font.resolution()) as f64;
    let line_advance = font.line_height() as f64 * scale;

    let mut contours = Vec::new();
    let mut pen_x = 0.0f64;
    let mut pen_y = 0.0f64;

    for ch in content.chars() {
        if ch == '\n' {
            pen_x = 0.0;
            pen_y -= line_advance;
            continue;
        }
        let Some(glyph) = font.glyph(ch) else {
            warn!(glyph = %ch, family = font.family(), "font has no glyph or '?' fallback, skipping");
            continue;
        };

        if !glyph.outline.elements().is_empty() {
            let mut outline = glyph.outline.clone();
            outline.apply_affine(Affine::translate((pen_x, pen_y)) * Affine::scale(scale));
            let mut glyph_contours = flatten(&outline, opts);
            mark_holes(&mut glyph_contours);
            contours.extend(glyph_contours);
        }

        pen_x += glyph.advance as f64 * scale;
    }

    let mut vertices = extrude(&contours, opts);
    center_on_bounds(&mut vertices);
    debug!(
        chars = content.chars().count(),
        contours = contours.len(),
        vertices = vertices.len(),
        "built text mesh"
    );

    ReferenceMesh { vertices }
}

fn to_vec2(p: Point) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32)
}

/// Flatten a path into polygons. Curves get `curve_segments` steps, lines
/// are split so no edge is longer than `edge_spacing`.
fn flatten(path: &kurbo::BezPath, opts: &TextOptions) -> Vec<Contour> {
    let curve_steps = opts.curve_segments.max(1);
    let spacing = opts.edge_spacing.max(1e-3);

    let mut contours = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;

    let push_line = |points: &mut Vec<Vec2>, from: Point, to: Point| {
        let (a, b) = (to_vec2(from), to_vec2(to));
        let steps = ((a.distance(b) / spacing).ceil() as u32).max(1);
        for s in 1..=steps {
            points.push(a.lerp(b, s as f32 / steps as f32));
        }
    };

    let finish = |points: &mut Vec<Vec2>, contours: &mut Vec<Contour>| {
        // Closing segments end on the start point
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() >= 3 {
            contours.push(Contour {
                points: std::mem::take(points),
                hole: false,
            });
        } else {
            points.clear();
        }
    };

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                finish(&mut current, &mut contours);
                current.push(to_vec2(p));
                start = p;
                last = p;
            }
            PathEl::LineTo(p) => {
                push_line(&mut current, last, p);
                last = p;
            }
            PathEl::QuadTo(c, p) => {
                let q = QuadBez::new(last, c, p);
                for s in 1..=curve_steps {
                    current.push(to_vec2(q.eval(s as f64 / curve_steps as f64)));
                }
                last = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                let c = CubicBez::new(last, c1, c2, p);
                for s in 1..=curve_steps {
                    current.push(to_vec2(c.eval(s as f64 / curve_steps as f64)));
                }
                last = p;
            }
            PathEl::ClosePath => {
                if last != start {
                    push_line(&mut current, last, start);
                }
                finish(&mut current, &mut contours);
                last = start;
            }
        }
    }
    finish(&mut current, &mut contours);

    contours
}

/// Even-odd rule: a contour nested inside an odd number of others is a hole.
fn mark_holes(contours: &mut [Contour]) {
    let flags: Vec<bool> = contours
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let first = c.points[0];
            contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && point_in_polygon(first, &other.points))
                .count()
                % 2
                == 1
        })
        .collect();
    for (c, hole) in contours.iter_mut().zip(flags) {
        c.hole = hole;
    }
}

fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn signed_area(poly: &[Vec2]) -> f32 {
    let n = poly.len();
    (0..n)
        .map(|i| poly[i].perp_dot(poly[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Per-vertex normals pointing away from the letter's material: outward on
/// outer contours, into the hole on holes.
fn bevel_normals(contour: &Contour) -> Vec<Vec2> {
    let pts = &contour.points;
    let n = pts.len();
    let mut orient = signed_area(pts).signum();
    if contour.hole {
        orient = -orient;
    }

    let edge_normal = |i: usize| {
        let d = pts[(i + 1) % n] - pts[i];
        Vec2::new(d.y, -d.x).normalize_or_zero() * orient
    };

    (0..n)
        .map(|i| {
            let prev = edge_normal((i + n - 1) % n);
            let next = edge_normal(i);
            let avg = (prev + next).normalize_or_zero();
            if avg == Vec2::ZERO {
                next
            } else {
                avg
            }
        })
        .collect()
}

fn extrude(contours: &[Contour], opts: &TextOptions) -> Vec<Vec3> {
    let depth = opts.depth.max(0.0);
    let bevel = opts.bevel_segments > 0 && (opts.bevel_thickness > 0.0 || opts.bevel_size > 0.0);
    let side_offset = if bevel { opts.bevel_size } else { 0.0 };

    // (z, outline offset) for every ring, front to back
    let mut rings: Vec<(f32, f32)> = Vec::new();
    if bevel {
        let segs = opts.bevel_segments;
        for b in 0..segs {
            let t = b as f32 / segs as f32 * FRAC_PI_2;
            rings.push((-opts.bevel_thickness * t.cos(), opts.bevel_size * t.sin()));
        }
    }
    let layers = ((depth / opts.edge_spacing.max(1e-3)).ceil() as u32).max(1);
    for k in 0..=layers {
        rings.push((depth * k as f32 / layers as f32, side_offset));
    }
    if bevel {
        let segs = opts.bevel_segments;
        for b in (0..segs).rev() {
            let t = b as f32 / segs as f32 * FRAC_PI_2;
            rings.push((depth + opts.bevel_thickness * t.cos(), opts.bevel_size * t.sin()));
        }
    }

    let total: usize = contours.iter().map(|c| c.points.len()).sum();
    let mut vertices = Vec::with_capacity(total * rings.len());
    for contour in contours {
        let normals = bevel_normals(contour);
        for &(z, offset) in &rings {
            for (p, n) in contour.points.iter().zip(&normals) {
                let q = *p + *n * offset;
                vertices.push(Vec3::new(q.x, q.y, z));
            }
        }
    }
    vertices
}

fn center_on_bounds(vertices: &mut [Vec3]) {
    let Some(first) = vertices.first().copied() else {
        return;
    };
    let (lo, hi) = vertices
        .iter()
        .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let center = (lo + hi) * 0.5;
    for v in vertices.iter_mut() {
        *v -= center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::TINY_FONT;

    fn font() -> TypefaceFont {
        TypefaceFont::from_json(TINY_FONT.as_bytes()).unwrap()
    }

    fn flat_opts() -> TextOptions {
        TextOptions {
            bevel_segments: 0,
            ..TextOptions::default()
        }
    }

    #[test]
    fn test_empty_text_gives_empty_mesh() {
        let mesh = text_mesh(&font(), "", &TextOptions::default());
        assert_eq!(mesh.vertex_count(), 0);
        let mesh = text_mesh(&font(), "   ", &TextOptions::default());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_mesh_is_centered() {
        let mesh = text_mesh(&font(), "AA\nA", &TextOptions::default());
        assert!(mesh.vertex_count() > 0);
        let first = mesh.vertices[0];
        let (lo, hi) = mesh
            .vertices
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        assert!(((lo + hi) * 0.5).length() < 1e-4);
    }

    #[test]
    fn test_layout_scale_and_advance() {
        // Two triangles side by side: width = 2 ems at size 4
        let mesh = text_mesh(&font(), "AA", &flat_opts());
        let xs = mesh.vertices.iter().map(|v| v.x);
        let width = xs.clone().fold(f32::MIN, f32::max) - xs.fold(f32::MAX, f32::min);
        assert!((width - 8.0).abs() < 1e-3, "width {width}");

        let zs = mesh.vertices.iter().map(|v| v.z);
        let depth = zs.clone().fold(f32::MIN, f32::max) - zs.fold(f32::MAX, f32::min);
        assert!((depth - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_glyph_uses_fallback() {
        let known = text_mesh(&font(), "?", &flat_opts());
        let unknown = text_mesh(&font(), "Z", &flat_opts());
        assert_eq!(known, unknown);
    }

    #[test]
    fn test_bevel_expands_outline() {
        let flat = text_mesh(&font(), "?", &flat_opts());
        let bevelled = text_mesh(&font(), "?", &TextOptions::default());
        let extent = |m: &ReferenceMesh| m.vertices.iter().map(|v| v.x).fold(f32::MIN, f32::max);
        assert!(bevelled.vertex_count() > flat.vertex_count());
        assert!((extent(&bevelled) - extent(&flat) - 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_hole_detection_and_normals() {
        let square = |s: f32| Contour {
            points: vec![
                Vec2::new(-s, -s),
                Vec2::new(s, -s),
                Vec2::new(s, s),
                Vec2::new(-s, s),
            ],
            hole: false,
        };
        let mut contours = vec![square(2.0), square(1.0)];
        mark_holes(&mut contours);
        assert!(!contours[0].hole);
        assert!(contours[1].hole);

        // Outer normals point away from the center, hole normals toward it
        let outer = bevel_normals(&contours[0]);
        let inner = bevel_normals(&contours[1]);
        assert!(outer[2].dot(contours[0].points[2]) > 0.0);
        assert!(inner[2].dot(contours[1].points[2]) < 0.0);
    }

    #[test]
    fn test_flatten_subdivides_curves() {
        let path = crate::font::parse_outline("m 0 0 q 2 0 1 1 l 0 2 z").unwrap();
        let opts = TextOptions {
            curve_segments: 4,
            edge_spacing: 100.0,
            ..TextOptions::default()
        };
        let contours = flatten(&path, &opts);
        assert_eq!(contours.len(), 1);
        // start + 4 curve steps + 1 line + closing line minus duplicated start
        assert_eq!(contours[0].points.len(), 6);
    }
}
