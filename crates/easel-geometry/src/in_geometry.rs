//! Raw input geometry: vertex attribute arrays, edges and curve flattening.
//!
//! An [`InGeometry`] accumulates the vertices of one shape between clears.
//! Attributes live in parallel growable arrays; edges describing the
//! stroked connectivity of fill primitives are derived per topology so that
//! shared join points are never double-capped.

use crate::error::GeometryError;
use crate::style::VertexStyle;
use crate::tables::{SINCOS_LENGTH, SIN_COS, SphereTable};
use glam::{Vec2, Vec3};
use std::ops::Range;

/// Edge role within a stroked contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// First edge of a visible line run.
    Start,
    /// Interior edge joined to its neighbors.
    Middle,
    /// Last edge of a run. An `End` edge whose endpoint is the run's first
    /// vertex closes the loop instead of capping it.
    End,
    /// An edge that is a run by itself.
    Single,
}

/// A line segment between two input vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: u32,
    pub b: u32,
    pub kind: EdgeKind,
}

type RowMat = [[f32; 4]; 4];

const BEZIER_BASIS: RowMat = [
    [-1.0, 3.0, -3.0, 1.0],
    [3.0, -6.0, 3.0, 0.0],
    [-3.0, 3.0, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
];

fn curve_basis(s: f32) -> RowMat {
    [
        [(s - 1.0) / 2.0, (s + 3.0) / 2.0, (-3.0 - s) / 2.0, (1.0 - s) / 2.0],
        [1.0 - s, (-5.0 - s) / 2.0, s + 2.0, (s - 1.0) / 2.0],
        [(s - 1.0) / 2.0, 0.0, (1.0 - s) / 2.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
    ]
}

/// Repeated-addition stepping matrix for `detail` steps along a cubic.
fn spline_forward(detail: u32) -> RowMat {
    let f = 1.0 / detail as f32;
    let f2 = f * f;
    let f3 = f2 * f;
    [
        [0.0, 0.0, 0.0, 1.0],
        [f3, f2, f, 0.0],
        [6.0 * f3, 2.0 * f2, 0.0, 0.0],
        [6.0 * f3, 0.0, 0.0, 0.0],
    ]
}

fn mat_mul(a: &RowMat, b: &RowMat) -> RowMat {
    let mut out = [[0.0f32; 4]; 4];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn row_dot(row: &[f32; 4], p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    p0 * row[0] + p1 * row[1] + p2 * row[2] + p3 * row[3]
}

/// Resizable structure-of-arrays holding the raw vertices and edges of one
/// shape.
#[derive(Debug, Clone, Default)]
pub struct InGeometry {
    positions: Vec<Vec3>,
    colors: Vec<u32>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    stroke_colors: Vec<u32>,
    stroke_weights: Vec<f32>,
    ambient: Vec<u32>,
    specular: Vec<u32>,
    emissive: Vec<u32>,
    shininess: Vec<f32>,
    breaks: Vec<bool>,
    edges: Vec<Edge>,

    bezier_draw: Option<(u32, RowMat)>,
    curve_draw: Option<(u32, f32, RowMat)>,
    curve_points: Vec<Vec3>,
}

impl InGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counts to zero, keeping allocated storage.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.normals.clear();
        self.uvs.clear();
        self.stroke_colors.clear();
        self.stroke_weights.clear();
        self.ambient.clear();
        self.specular.clear();
        self.emissive.clear();
        self.shininess.clear();
        self.breaks.clear();
        self.edges.clear();
        self.curve_points.clear();
    }

    /// Shrink backing storage to the current counts.
    pub fn trim(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.normals.shrink_to_fit();
        self.uvs.shrink_to_fit();
        self.stroke_colors.shrink_to_fit();
        self.stroke_weights.shrink_to_fit();
        self.ambient.shrink_to_fit();
        self.specular.shrink_to_fit();
        self.emissive.shrink_to_fit();
        self.shininess.shrink_to_fit();
        self.breaks.shrink_to_fit();
        self.edges.shrink_to_fit();
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.positions[i]
    }

    pub fn fill_color(&self, i: usize) -> u32 {
        self.colors[i]
    }

    pub fn normal(&self, i: usize) -> Vec3 {
        self.normals[i]
    }

    pub fn uv(&self, i: usize) -> Vec2 {
        self.uvs[i]
    }

    pub fn stroke_color(&self, i: usize) -> u32 {
        self.stroke_colors[i]
    }

    pub fn stroke_weight(&self, i: usize) -> f32 {
        self.stroke_weights[i]
    }

    pub fn ambient(&self, i: usize) -> u32 {
        self.ambient[i]
    }

    pub fn specular(&self, i: usize) -> u32 {
        self.specular[i]
    }

    pub fn emissive(&self, i: usize) -> u32 {
        self.emissive[i]
    }

    pub fn shininess(&self, i: usize) -> f32 {
        self.shininess[i]
    }

    /// Whether vertex `i` starts a new contour.
    pub fn breaks_at(&self, i: usize) -> bool {
        self.breaks[i]
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Append one fully-styled vertex. `brk` marks the start of a new
    /// contour and resets any in-progress curve run.
    pub fn add_vertex(&mut self, pos: Vec3, style: &VertexStyle, brk: bool) -> u32 {
        if brk {
            self.curve_points.clear();
        }
        self.positions.push(pos);
        self.colors.push(style.fill.packed());
        self.normals.push(style.normal);
        self.uvs.push(style.uv);
        self.stroke_colors.push(style.stroke.packed());
        self.stroke_weights.push(style.stroke_weight);
        self.ambient.push(style.ambient.packed());
        self.specular.push(style.specular.packed());
        self.emissive.push(style.emissive.packed());
        self.shininess.push(style.shininess);
        self.breaks.push(brk);
        (self.positions.len() - 1) as u32
    }

    /// Overwrite the normal of vertex `i`.
    pub fn set_normal(&mut self, i: usize, normal: Vec3) {
        self.normals[i] = normal;
    }

    /// Overwrite the texture coordinate of vertex `i`.
    pub fn set_uv(&mut self, i: usize, uv: Vec2) {
        self.uvs[i] = uv;
    }

    pub fn add_edge(&mut self, a: u32, b: u32, kind: EdgeKind) {
        self.edges.push(Edge { a, b, kind });
    }

    // ------------------------------------------------------------------
    // Primitives

    /// Append a point primitive.
    pub fn add_point(&mut self, pos: Vec3, style: &VertexStyle) -> u32 {
        self.add_vertex(pos, style, true)
    }

    /// Append a line primitive with its isolated edge.
    pub fn add_line(&mut self, a: Vec3, b: Vec3, style: &VertexStyle) {
        let i0 = self.add_vertex(a, style, true);
        let i1 = self.add_vertex(b, style, false);
        self.add_edge(i0, i1, EdgeKind::Single);
    }

    /// Append a triangle primitive.
    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, style: &VertexStyle, stroke: bool) {
        let i0 = self.add_vertex(a, style, true);
        let i1 = self.add_vertex(b, style, false);
        let i2 = self.add_vertex(c, style, false);
        if stroke {
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i0, EdgeKind::End);
        }
    }

    /// Append a quad primitive (vertices in contour order).
    pub fn add_quad(
        &mut self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        d: Vec3,
        style: &VertexStyle,
        stroke: bool,
    ) {
        let i0 = self.add_vertex(a, style, true);
        let i1 = self.add_vertex(b, style, false);
        let i2 = self.add_vertex(c, style, false);
        let i3 = self.add_vertex(d, style, false);
        if stroke {
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i3, EdgeKind::Middle);
            self.add_edge(i3, i0, EdgeKind::End);
        }
    }

    /// Append an axis-aligned rectangle spanning `a` to `b` at z = 0.
    pub fn add_rect(&mut self, a: Vec2, b: Vec2, style: &VertexStyle, stroke: bool) {
        let corner = |x: f32, y: f32, u: f32, v: f32, s: &VertexStyle| {
            (Vec3::new(x, y, 0.0), s.with_uv(Vec2::new(u, v)))
        };
        let (p0, s0) = corner(a.x, a.y, 0.0, 0.0, style);
        let (p1, s1) = corner(b.x, a.y, 1.0, 0.0, style);
        let (p2, s2) = corner(b.x, b.y, 1.0, 1.0, style);
        let (p3, s3) = corner(a.x, b.y, 0.0, 1.0, style);

        let i0 = self.add_vertex(p0, &s0, true);
        let i1 = self.add_vertex(p1, &s1, false);
        let i2 = self.add_vertex(p2, &s2, false);
        let i3 = self.add_vertex(p3, &s3, false);
        if stroke {
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i3, EdgeKind::Middle);
            self.add_edge(i3, i0, EdgeKind::End);
        }
    }

    /// Append a rounded rectangle as a closed polygon contour.
    ///
    /// `radii` are the corner radii in top-left, top-right, bottom-right,
    /// bottom-left order; each corner is a quadratic Bézier flattened into
    /// `detail` segments.
    pub fn add_rounded_rect(
        &mut self,
        a: Vec2,
        b: Vec2,
        radii: [f32; 4],
        detail: u32,
        style: &VertexStyle,
        stroke: bool,
    ) {
        let detail = detail.max(1);
        let w = (b.x - a.x).abs();
        let h = (b.y - a.y).abs();
        let clamp_r = |r: f32| r.max(0.0).min(w / 2.0).min(h / 2.0);
        let [tl, tr, br, bl] = [
            clamp_r(radii[0]),
            clamp_r(radii[1]),
            clamp_r(radii[2]),
            clamp_r(radii[3]),
        ];

        let first = self.vertex_count();
        let mut brk = true;
        let mut put = |geom: &mut Self, p: Vec2| {
            let uv = Vec2::new((p.x - a.x) / w.max(f32::EPSILON), (p.y - a.y) / h.max(f32::EPSILON));
            geom.add_vertex(p.extend(0.0), &style.with_uv(uv), brk);
            brk = false;
        };

        // Walk the outline clockwise from the end of the top-left corner,
        // flattening each rounded corner through its quadratic control point.
        put(self, Vec2::new(a.x + tl, a.y));
        put(self, Vec2::new(b.x - tr, a.y));
        self.flatten_corner(
            Vec2::new(b.x - tr, a.y),
            Vec2::new(b.x, a.y),
            Vec2::new(b.x, a.y + tr),
            tr,
            detail,
            a,
            w,
            h,
            style,
        );
        self.put_outline_point(Vec2::new(b.x, b.y - br), a, w, h, style);
        self.flatten_corner(
            Vec2::new(b.x, b.y - br),
            Vec2::new(b.x, b.y),
            Vec2::new(b.x - br, b.y),
            br,
            detail,
            a,
            w,
            h,
            style,
        );
        self.put_outline_point(Vec2::new(a.x + bl, b.y), a, w, h, style);
        self.flatten_corner(
            Vec2::new(a.x + bl, b.y),
            Vec2::new(a.x, b.y),
            Vec2::new(a.x, b.y - bl),
            bl,
            detail,
            a,
            w,
            h,
            style,
        );
        self.put_outline_point(Vec2::new(a.x, a.y + tl), a, w, h, style);
        self.flatten_corner(
            Vec2::new(a.x, a.y + tl),
            Vec2::new(a.x, a.y),
            Vec2::new(a.x + tl, a.y),
            tl,
            detail,
            a,
            w,
            h,
            style,
        );

        // The last corner ends where the outline started; drop the repeat.
        if self
            .positions
            .last()
            .is_some_and(|p| p.truncate().distance_squared(Vec2::new(a.x + tl, a.y)) < 1e-12)
        {
            self.pop_vertex();
        }

        let last = self.vertex_count();
        if stroke {
            self.add_polygon_edges(first..last, true);
        }
    }

    fn put_outline_point(&mut self, p: Vec2, origin: Vec2, w: f32, h: f32, style: &VertexStyle) {
        let uv = Vec2::new(
            (p.x - origin.x) / w.max(f32::EPSILON),
            (p.y - origin.y) / h.max(f32::EPSILON),
        );
        self.add_vertex(p.extend(0.0), &style.with_uv(uv), false);
    }

    #[allow(clippy::too_many_arguments)]
    fn flatten_corner(
        &mut self,
        from: Vec2,
        ctrl: Vec2,
        to: Vec2,
        radius: f32,
        detail: u32,
        origin: Vec2,
        w: f32,
        h: f32,
        style: &VertexStyle,
    ) {
        if radius <= 0.0 {
            if from.distance_squared(to) > 1e-12 {
                self.put_outline_point(to, origin, w, h, style);
            }
            return;
        }
        for k in 1..=detail {
            let t = k as f32 / detail as f32;
            let mt = 1.0 - t;
            let p = from * (mt * mt) + ctrl * (2.0 * mt * t) + to * (t * t);
            self.put_outline_point(p, origin, w, h, style);
        }
    }

    fn pop_vertex(&mut self) {
        self.positions.pop();
        self.colors.pop();
        self.normals.pop();
        self.uvs.pop();
        self.stroke_colors.pop();
        self.stroke_weights.pop();
        self.ambient.pop();
        self.specular.pop();
        self.emissive.pop();
        self.shininess.pop();
        self.breaks.pop();
    }

    /// Append an ellipse as a triangle fan: center vertex, perimeter ring
    /// and a repeat of the first perimeter vertex.
    ///
    /// `scale` is the on-screen scale factor; the angular step count grows
    /// with the projected size so curvature detail tracks zoom level.
    pub fn add_ellipse(
        &mut self,
        center: Vec2,
        radii: Vec2,
        scale: f32,
        style: &VertexStyle,
        stroke: bool,
    ) {
        let detail = ellipse_detail(radii, scale);
        let inc = SINCOS_LENGTH as f32 / detail as f32;

        let center_style = style.with_uv(Vec2::new(0.5, 0.5));
        self.add_vertex(center.extend(0.0), &center_style, true);

        let first = self.vertex_count();
        let mut angle = 0.0f32;
        for _ in 0..detail {
            let slot = angle as usize;
            let dir = SIN_COS.direction(slot);
            let p = center + dir * radii;
            let uv = Vec2::new(0.5 + 0.5 * dir.x, 0.5 + 0.5 * dir.y);
            self.add_vertex(p.extend(0.0), &style.with_uv(uv), false);
            angle += inc;
        }
        // Repeat the first perimeter vertex so the fan closes without
        // wrapping indices.
        let p = self.positions[first];
        let uv = self.uvs[first];
        self.add_vertex(p, &style.with_uv(uv), false);

        if stroke {
            let last = first + detail as usize - 1;
            self.add_edge(first as u32, first as u32 + 1, EdgeKind::Start);
            for i in first + 1..last {
                self.add_edge(i as u32, i as u32 + 1, EdgeKind::Middle);
            }
            self.add_edge(last as u32, first as u32, EdgeKind::End);
        }
    }

    /// Append an elliptical arc from `start` to `stop` radians.
    ///
    /// `Pie` arcs are laid out as a fan around the center vertex and stroke
    /// both radii; `Chord` arcs close the perimeter with a straight edge;
    /// `Open` arcs leave the stroke uncapped at the chord.
    #[allow(clippy::too_many_arguments)]
    pub fn add_arc(
        &mut self,
        center: Vec2,
        radii: Vec2,
        start: f32,
        stop: f32,
        mode: crate::ArcMode,
        scale: f32,
        style: &VertexStyle,
        stroke: bool,
    ) {
        use crate::ArcMode;

        let sweep = (stop - start).clamp(-std::f32::consts::TAU, std::f32::consts::TAU);
        if sweep.abs() < 1e-6 {
            return;
        }
        let full_detail = ellipse_detail(radii, scale);
        let steps = ((full_detail as f32 * sweep.abs() / std::f32::consts::TAU).ceil() as u32).max(2);

        let pie = matches!(mode, ArcMode::Pie);
        let center_index = if pie {
            let center_style = style.with_uv(Vec2::new(0.5, 0.5));
            Some(self.add_vertex(center.extend(0.0), &center_style, true))
        } else {
            None
        };

        let first = self.vertex_count();
        for k in 0..=steps {
            let theta = start + sweep * k as f32 / steps as f32;
            let slot = (theta.rem_euclid(std::f32::consts::TAU) / std::f32::consts::TAU
                * SINCOS_LENGTH as f32) as usize;
            let dir = SIN_COS.direction(slot);
            let p = center + dir * radii;
            let uv = Vec2::new(0.5 + 0.5 * dir.x, 0.5 + 0.5 * dir.y);
            self.add_vertex(p.extend(0.0), &style.with_uv(uv), !pie && k == 0);
        }
        let last = self.vertex_count() - 1;

        if !stroke {
            return;
        }
        match mode {
            ArcMode::Open => {
                self.add_edge(first as u32, first as u32 + 1, EdgeKind::Start);
                for i in first + 1..last - 1 {
                    self.add_edge(i as u32, i as u32 + 1, EdgeKind::Middle);
                }
                self.add_edge(last as u32 - 1, last as u32, EdgeKind::End);
            }
            ArcMode::Chord => {
                self.add_edge(first as u32, first as u32 + 1, EdgeKind::Start);
                for i in first + 1..last {
                    self.add_edge(i as u32, i as u32 + 1, EdgeKind::Middle);
                }
                self.add_edge(last as u32, first as u32, EdgeKind::End);
            }
            ArcMode::Pie => {
                if let Some(c) = center_index {
                    self.add_edge(c, first as u32, EdgeKind::Start);
                    for i in first..last {
                        self.add_edge(i as u32, i as u32 + 1, EdgeKind::Middle);
                    }
                    self.add_edge(last as u32, c, EdgeKind::End);
                }
            }
        }
    }

    /// Append an axis-aligned box as six quads with per-face normals.
    pub fn add_box(&mut self, size: Vec3, style: &VertexStyle, stroke: bool) {
        let h = size / 2.0;
        let faces: [([Vec3; 4], Vec3); 6] = [
            // +Z
            (
                [
                    Vec3::new(-h.x, -h.y, h.z),
                    Vec3::new(h.x, -h.y, h.z),
                    Vec3::new(h.x, h.y, h.z),
                    Vec3::new(-h.x, h.y, h.z),
                ],
                Vec3::Z,
            ),
            // -Z
            (
                [
                    Vec3::new(h.x, -h.y, -h.z),
                    Vec3::new(-h.x, -h.y, -h.z),
                    Vec3::new(-h.x, h.y, -h.z),
                    Vec3::new(h.x, h.y, -h.z),
                ],
                Vec3::NEG_Z,
            ),
            // +X
            (
                [
                    Vec3::new(h.x, -h.y, h.z),
                    Vec3::new(h.x, -h.y, -h.z),
                    Vec3::new(h.x, h.y, -h.z),
                    Vec3::new(h.x, h.y, h.z),
                ],
                Vec3::X,
            ),
            // -X
            (
                [
                    Vec3::new(-h.x, -h.y, -h.z),
                    Vec3::new(-h.x, -h.y, h.z),
                    Vec3::new(-h.x, h.y, h.z),
                    Vec3::new(-h.x, h.y, -h.z),
                ],
                Vec3::NEG_X,
            ),
            // +Y
            (
                [
                    Vec3::new(-h.x, h.y, h.z),
                    Vec3::new(h.x, h.y, h.z),
                    Vec3::new(h.x, h.y, -h.z),
                    Vec3::new(-h.x, h.y, -h.z),
                ],
                Vec3::Y,
            ),
            // -Y
            (
                [
                    Vec3::new(-h.x, -h.y, -h.z),
                    Vec3::new(h.x, -h.y, -h.z),
                    Vec3::new(h.x, -h.y, h.z),
                    Vec3::new(-h.x, -h.y, h.z),
                ],
                Vec3::NEG_Y,
            ),
        ];

        const FACE_UVS: [Vec2; 4] = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        for (corners, normal) in faces {
            let styled = style.with_normal(normal);
            let base = self.vertex_count() as u32;
            for (k, (corner, uv)) in corners.into_iter().zip(FACE_UVS).enumerate() {
                self.add_vertex(corner, &styled.with_uv(uv), k == 0);
            }
            if stroke {
                self.add_edge(base, base + 1, EdgeKind::Start);
                self.add_edge(base + 1, base + 2, EdgeKind::Middle);
                self.add_edge(base + 2, base + 3, EdgeKind::Middle);
                self.add_edge(base + 3, base, EdgeKind::End);
            }
        }
    }

    /// Append a UV sphere as explicit triangles read from a precomputed
    /// unit-sphere table.
    ///
    /// The degenerate triangle of each pole band is skipped, leaving one fan
    /// triangle per longitude step at each pole.
    pub fn add_sphere(
        &mut self,
        radius: f32,
        table: &SphereTable,
        style: &VertexStyle,
        stroke: bool,
    ) {
        let first = self.vertex_count();
        let du = table.detail_u();
        let dv = table.detail_v();

        let mut put = |geom: &mut Self, u: u32, v: u32, brk: bool| {
            let unit = table.vertex(u, v);
            let styled = style.with_normal(unit).with_uv(table.uv(u, v));
            geom.add_vertex(unit * radius, &styled, brk);
        };

        let mut brk = true;
        for v in 0..dv {
            for u in 0..du {
                // (u, v) .. (u + 1, v + 1) quad, two triangles unless one
                // collapses at a pole.
                if v != 0 {
                    put(self, u, v, brk);
                    brk = false;
                    put(self, u + 1, v, false);
                    put(self, u + 1, v + 1, false);
                }
                if v != dv - 1 {
                    put(self, u, v, brk);
                    brk = false;
                    put(self, u + 1, v + 1, false);
                    put(self, u, v + 1, false);
                }
            }
        }

        if stroke {
            self.add_triangles_edges(first..self.vertex_count());
        }
    }

    // ------------------------------------------------------------------
    // Curve flattening

    /// Append a cubic Bézier from the last committed vertex through two
    /// control points, flattened into `detail` forward-difference steps.
    pub fn bezier_vertex(
        &mut self,
        c1: Vec3,
        c2: Vec3,
        to: Vec3,
        detail: u32,
        style: &VertexStyle,
    ) -> Result<(), GeometryError> {
        let Some(&from) = self.positions.last() else {
            return Err(GeometryError::NoCurrentVertex {
                operation: "bezier_vertex",
            });
        };
        let detail = detail.max(1);
        let draw = self.bezier_draw(detail);
        self.run_forward_difference(from, draw, from, c1, c2, to, detail, style);
        Ok(())
    }

    /// Append a Catmull-Rom control point.
    ///
    /// Once four control points are buffered, each additional point emits a
    /// flattened segment between the middle two. The buffered run restarts
    /// whenever a contour break is appended.
    pub fn curve_vertex(&mut self, p: Vec3, detail: u32, tightness: f32, style: &VertexStyle) {
        let detail = detail.max(1);
        self.curve_points.push(p);
        let n = self.curve_points.len();
        if n < 4 {
            return;
        }

        let [p0, p1, p2, p3] = [
            self.curve_points[n - 4],
            self.curve_points[n - 3],
            self.curve_points[n - 2],
            self.curve_points[n - 1],
        ];
        let draw = self.curve_draw(detail, tightness);

        // The curve passes through the second control point; emit it only
        // when this segment starts the run.
        if n == 4 {
            let brk = self.positions.is_empty();
            self.add_vertex(p1, style, brk);
        }
        self.run_forward_difference(p1, draw, p0, p1, p2, p3, detail, style);
    }

    #[allow(clippy::too_many_arguments)]
    fn run_forward_difference(
        &mut self,
        start: Vec3,
        draw: RowMat,
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        p3: Vec3,
        detail: u32,
        style: &VertexStyle,
    ) {
        let mut p = start;
        let mut d1 = row_dot(&draw[1], p0, p1, p2, p3);
        let mut d2 = row_dot(&draw[2], p0, p1, p2, p3);
        let d3 = row_dot(&draw[3], p0, p1, p2, p3);
        for _ in 0..detail {
            p += d1;
            d1 += d2;
            d2 += d3;
            self.add_vertex(p, style, false);
        }
    }

    fn bezier_draw(&mut self, detail: u32) -> RowMat {
        if let Some((d, m)) = self.bezier_draw {
            if d == detail {
                return m;
            }
        }
        let m = mat_mul(&spline_forward(detail), &BEZIER_BASIS);
        self.bezier_draw = Some((detail, m));
        m
    }

    fn curve_draw(&mut self, detail: u32, tightness: f32) -> RowMat {
        if let Some((d, s, m)) = self.curve_draw {
            if d == detail && s == tightness {
                return m;
            }
        }
        let m = mat_mul(&spline_forward(detail), &curve_basis(tightness));
        self.curve_draw = Some((detail, tightness, m));
        m
    }

    // ------------------------------------------------------------------
    // Edge derivation

    /// Derive edges for a range of explicit triangles (three vertices per
    /// face).
    pub fn add_triangles_edges(&mut self, range: Range<usize>) {
        let mut i = range.start;
        while i + 3 <= range.end {
            let (i0, i1, i2) = (i as u32, (i + 1) as u32, (i + 2) as u32);
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i0, EdgeKind::End);
            i += 3;
        }
    }

    /// Derive edges for a triangle fan (first vertex is the hub).
    pub fn add_triangle_fan_edges(&mut self, range: Range<usize>) {
        let hub = range.start as u32;
        for i in range.start + 1..range.end.saturating_sub(1) {
            let (i1, i2) = (i as u32, (i + 1) as u32);
            self.add_edge(hub, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, hub, EdgeKind::End);
        }
    }

    /// Derive edges for a triangle strip.
    pub fn add_triangle_strip_edges(&mut self, range: Range<usize>) {
        for i in range.start + 1..range.end.saturating_sub(1) {
            let (i0, i1, i2) = (i as u32, (i - 1) as u32, (i + 1) as u32);
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i0, EdgeKind::End);
        }
    }

    /// Derive edges for a range of quads (four vertices per face).
    pub fn add_quads_edges(&mut self, range: Range<usize>) {
        let mut i = range.start;
        while i + 4 <= range.end {
            let (i0, i1, i2, i3) = (i as u32, (i + 1) as u32, (i + 2) as u32, (i + 3) as u32);
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i3, EdgeKind::Middle);
            self.add_edge(i3, i0, EdgeKind::End);
            i += 4;
        }
    }

    /// Derive edges for a quad strip.
    pub fn add_quad_strip_edges(&mut self, range: Range<usize>) {
        let mut qd = range.start + 3;
        while qd < range.end {
            let i0 = (qd - 3) as u32;
            let i1 = (qd - 2) as u32;
            let i2 = qd as u32;
            let i3 = (qd - 1) as u32;
            self.add_edge(i0, i1, EdgeKind::Start);
            self.add_edge(i1, i2, EdgeKind::Middle);
            self.add_edge(i2, i3, EdgeKind::Middle);
            self.add_edge(i3, i0, EdgeKind::End);
            qd += 2;
        }
    }

    /// Derive edges for a polygon vertex range, splitting contours at break
    /// flags. A closed polygon gets an explicit loop-closing edge back to
    /// each contour's first vertex.
    pub fn add_polygon_edges(&mut self, range: Range<usize>, closed: bool) {
        let mut contour_start = range.start;
        let mut i = range.start;
        while i <= range.end {
            let contour_ends = i == range.end || (i > range.start && self.breaks[i]);
            if contour_ends {
                self.add_contour_edges(contour_start..i, closed);
                contour_start = i;
            }
            i += 1;
        }
    }

    fn add_contour_edges(&mut self, contour: Range<usize>, closed: bool) {
        let len = contour.len();
        if len < 2 {
            return;
        }
        if len == 2 && !closed {
            self.add_edge(contour.start as u32, (contour.start + 1) as u32, EdgeKind::Single);
            return;
        }
        let first = contour.start as u32;
        let last = (contour.end - 1) as u32;
        for i in contour.start..contour.end - 1 {
            let kind = if i == contour.start {
                EdgeKind::Start
            } else if !closed && i == contour.end - 2 {
                EdgeKind::End
            } else {
                EdgeKind::Middle
            };
            self.add_edge(i as u32, (i + 1) as u32, kind);
        }
        if closed {
            self.add_edge(last, first, EdgeKind::End);
        }
    }

    // ------------------------------------------------------------------
    // Auto-normals

    fn set_face_normal(&mut self, i0: usize, i1: usize, i2: usize) {
        let v0 = self.positions[i0];
        let v1 = self.positions[i1];
        let v2 = self.positions[i2];
        let normal = (v2 - v1).cross(v0 - v1).normalize_or_zero();
        self.normals[i0] = normal;
        self.normals[i1] = normal;
        self.normals[i2] = normal;
    }

    /// Flat-shade a range of explicit triangles.
    pub fn calc_triangles_normals(&mut self, range: Range<usize>) {
        let mut i = range.start;
        while i + 3 <= range.end {
            self.set_face_normal(i, i + 1, i + 2);
            i += 3;
        }
    }

    /// Flat-shade a triangle fan.
    pub fn calc_triangle_fan_normals(&mut self, range: Range<usize>) {
        for i in range.start + 1..range.end.saturating_sub(1) {
            self.set_face_normal(range.start, i, i + 1);
        }
    }

    /// Flat-shade a triangle strip, alternating winding per face.
    pub fn calc_triangle_strip_normals(&mut self, range: Range<usize>) {
        for i in range.start + 2..range.end {
            let face = i - range.start;
            if face % 2 == 0 {
                self.set_face_normal(i - 2, i - 1, i);
            } else {
                self.set_face_normal(i - 1, i - 2, i);
            }
        }
    }

    /// Flat-shade a range of quads.
    pub fn calc_quads_normals(&mut self, range: Range<usize>) {
        let mut i = range.start;
        while i + 4 <= range.end {
            self.set_face_normal(i, i + 1, i + 2);
            let normal = self.normals[i];
            self.normals[i + 3] = normal;
            i += 4;
        }
    }

    /// Flat-shade a quad strip.
    pub fn calc_quad_strip_normals(&mut self, range: Range<usize>) {
        let mut qd = range.start + 3;
        while qd < range.end {
            self.set_face_normal(qd - 3, qd - 2, qd);
            let normal = self.normals[qd - 3];
            self.normals[qd - 1] = normal;
            qd += 2;
        }
    }
}

/// Angular step count for an ellipse of the given radii at the given
/// on-screen scale.
fn ellipse_detail(radii: Vec2, scale: f32) -> u32 {
    let size = radii.x.abs().max(radii.y.abs()) * scale.abs();
    let steps = (std::f32::consts::TAU * size / 10.0).round() as i64;
    steps.clamp(20, (SINCOS_LENGTH / 2) as i64) as u32
}
