//! Tessellation entry points: points, lines, fills and batch-safe indexing.
//!
//! The tessellator reads an [`InGeometry`], transforms vertices, and emits
//! attribute data and indices into a [`TessGeometry`], recording polygon
//! texture ranges in a [`TexCache`]. General contour decomposition is
//! delegated to Lyon's sweep-line fill tessellator with a full attribute
//! payload per endpoint, so synthesized intersection vertices interpolate
//! every rendering attribute, not just position.

use crate::color::Color;
use crate::error::GeometryError;
use crate::in_geometry::{EdgeKind, InGeometry};
use crate::index_split::split_raw_indices;
use crate::line_path::{LinePath, LinePathCommand};
use crate::style::{FillRule, LineCap, StrokeMode, TessParams};
use crate::tables::{SINCOS_LENGTH, SIN_COS};
use crate::tess_geometry::{LineStream, PolyStream, TessGeometry};
use crate::tex_cache::{TexCache, TextureId};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex as LyonFillVertex, VertexBuffers,
};
use lyon::math::point;

/// Number of interpolated floats carried per fill-path endpoint:
/// z, fill RGBA, normal, uv, ambient RGBA, specular RGBA, emissive RGBA,
/// shininess. Positions x/y are the path coordinates themselves.
const FILL_ATTRIBUTES: usize = 23;

/// Tuning parameters for the tessellator.
///
/// The accuracy constants have no analytic derivation; they are exposed here
/// rather than hard-coded so callers can tune them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellatorConfig {
    /// Representable-index ceiling per batch, as dictated by the index type
    /// of the binding layer. Capped at `1 << 16` for `u16` indices.
    pub max_batch_vertices: usize,
    /// Floor on the perimeter vertex count of round points.
    pub min_point_accuracy: u32,
    /// Cap on the perimeter vertex count of round points.
    pub max_point_accuracy: u32,
    /// Divisor scaling perimeter vertex count with on-screen size.
    pub point_accuracy_factor: f32,
    /// On-screen stroke weight below which caps and joins are visually
    /// negligible and the fast per-segment path is used.
    pub min_caps_joins_weight: f32,
    /// Polyline length beyond which accurate stroking is abandoned for the
    /// fast path instead of overwhelming the fill tessellator.
    pub max_accurate_stroke_vertices: usize,
}

impl TessellatorConfig {
    pub fn with_max_batch_vertices(mut self, max: usize) -> Self {
        self.max_batch_vertices = max.clamp(4, 1 << 16);
        self
    }

    pub fn with_point_accuracy(mut self, min: u32, max: u32, factor: f32) -> Self {
        self.min_point_accuracy = min.max(3);
        self.max_point_accuracy = max.max(self.min_point_accuracy);
        self.point_accuracy_factor = factor.max(f32::EPSILON);
        self
    }

    pub fn with_min_caps_joins_weight(mut self, weight: f32) -> Self {
        self.min_caps_joins_weight = weight.max(0.0);
        self
    }

    pub fn with_max_accurate_stroke_vertices(mut self, max: usize) -> Self {
        self.max_accurate_stroke_vertices = max;
        self
    }
}

impl Default for TessellatorConfig {
    fn default() -> Self {
        Self {
            max_batch_vertices: 1 << 16,
            min_point_accuracy: 20,
            max_point_accuracy: 200,
            point_accuracy_factor: 10.0,
            min_caps_joins_weight: 2.0,
            max_accurate_stroke_vertices: 5000,
        }
    }
}

/// Converts input geometry into GPU-ready tessellated batches.
pub struct Tessellator {
    config: TessellatorConfig,
    fill: FillTessellator,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self::with_config(TessellatorConfig::default())
    }

    pub fn with_config(config: TessellatorConfig) -> Self {
        let config = TessellatorConfig {
            max_batch_vertices: config.max_batch_vertices.clamp(4, 1 << 16),
            ..config
        };
        Self {
            config,
            fill: FillTessellator::new(),
        }
    }

    pub fn config(&self) -> &TessellatorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Points

    /// Tessellate every input vertex as a point sprite.
    ///
    /// Round points (selected by a round stroke cap) become triangle fans
    /// whose perimeter count scales with the stroke weight; square points
    /// are fixed five-vertex fans. In 3D mode the fan vertices share the
    /// point's position and carry billboard offsets for a shader stage; in
    /// 2D mode the offsets are baked into positions and the fans go to the
    /// polygon stream.
    pub fn tessellate_points(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let n = src.vertex_count();
        if n == 0 {
            return;
        }
        let round = params.cap == LineCap::Round;

        if params.is_3d {
            self.points_3d(src, out, params, round);
        } else {
            self.points_2d(src, out, tex, params, round);
        }
    }

    fn point_perimeter(&self, round: bool, weight: f32) -> usize {
        if round {
            let steps = (std::f32::consts::TAU * weight / self.config.point_accuracy_factor)
                .round() as i64;
            steps.clamp(
                self.config.min_point_accuracy as i64,
                self.config.max_point_accuracy as i64,
            ) as usize
        } else {
            4
        }
    }

    fn point_offsets(&self, round: bool, weight: f32, perimeter: usize) -> Vec<Vec2> {
        let radius = weight / 2.0;
        if round {
            let inc = SINCOS_LENGTH as f32 / perimeter as f32;
            let mut angle = 0.0f32;
            (0..perimeter)
                .map(|_| {
                    let dir = SIN_COS.direction(angle as usize);
                    angle += inc;
                    dir * radius
                })
                .collect()
        } else {
            vec![
                Vec2::new(radius, radius),
                Vec2::new(-radius, radius),
                Vec2::new(-radius, -radius),
                Vec2::new(radius, -radius),
            ]
        }
    }

    fn points_3d(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        params: &TessParams,
        round: bool,
    ) {
        let xf = Transform::new(params);
        let point = &mut out.point;
        let mut entry = open_entry(&mut point.cache, params.retained);

        for i in 0..src.vertex_count() {
            let weight = src.stroke_weight(i);
            if weight <= 0.0 {
                continue;
            }
            let perimeter = self.point_perimeter(round, weight);
            let nvert = perimeter + 1;
            if point.cache.entry(entry).vertex_count + nvert > self.config.max_batch_vertices {
                entry = point.cache.add_new();
            }
            let base = point.cache.entry(entry).vertex_count;

            let position = xf.position(src.position(i));
            let color = src.stroke_color(i);
            point.push_vertex(position, color, Vec2::ZERO);
            for offset in self.point_offsets(round, weight, perimeter) {
                point.push_vertex(position, color, offset);
            }
            for k in 0..perimeter {
                point.push_index(base as u16);
                point.push_index((base + 1 + k) as u16);
                point.push_index((base + 1 + (k + 1) % perimeter) as u16);
            }
            point.cache.inc_counts(entry, 3 * perimeter, nvert);
        }
    }

    fn points_2d(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        round: bool,
    ) {
        let mut vertices = Vec::new();
        let mut raw = Vec::new();

        for i in 0..src.vertex_count() {
            let weight = src.stroke_weight(i);
            if weight <= 0.0 {
                continue;
            }
            let perimeter = self.point_perimeter(round, weight);
            let center = src.position(i);
            let color = src.stroke_color(i);
            let base = vertices.len() as u32;

            vertices.push(point_poly_vertex(center, color));
            for offset in self.point_offsets(round, weight, perimeter) {
                vertices.push(point_poly_vertex(center + offset.extend(0.0), color));
            }
            for k in 0..perimeter as u32 {
                raw.push(base);
                raw.push(base + 1 + k);
                raw.push(base + 1 + (k + 1) % perimeter as u32);
            }
        }

        self.emit_poly(out, tex, params, None, &vertices, &raw);
    }

    // ------------------------------------------------------------------
    // Lines

    /// Tessellate input vertices as independent segments (pairs).
    pub fn tessellate_lines(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let n = src.vertex_count();
        if n < 2 {
            return;
        }
        let pairs = n / 2;
        if self.use_fast_path(src, params, n) {
            let xf = Transform::new(params);
            let line = &mut out.line;
            let mut entry = open_entry(&mut line.cache, params.retained);
            for p in 0..pairs {
                let a = line_endpoint(src, &xf, 2 * p);
                let b = line_endpoint(src, &xf, 2 * p + 1);
                self.fast_segment(line, &mut entry, a, b);
            }
        } else {
            let mut path = LinePath::new();
            for p in 0..pairs {
                path.move_to(
                    src.position(2 * p).truncate(),
                    src.stroke_color(2 * p),
                );
                path.line_to(
                    src.position(2 * p + 1).truncate(),
                    src.stroke_color(2 * p + 1),
                );
            }
            self.stroke_path(src, out, tex, params, &path);
        }
    }

    /// Tessellate input vertices as a connected polyline.
    pub fn tessellate_line_strip(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        self.polyline(src, out, tex, params, false);
    }

    /// Tessellate input vertices as a closed polyline.
    pub fn tessellate_line_loop(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        self.polyline(src, out, tex, params, true);
    }

    fn polyline(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        closed: bool,
    ) {
        let n = src.vertex_count();
        if n < 2 {
            return;
        }
        if self.use_fast_path(src, params, n) {
            let xf = Transform::new(params);
            let line = &mut out.line;
            let mut entry = open_entry(&mut line.cache, params.retained);

            let mut carry: Option<SegmentEnd> = None;
            let mut first_start: Option<SegmentEnd> = None;
            let segments = if closed { n } else { n - 1 };
            for s in 0..segments {
                let a = line_endpoint(src, &xf, s);
                let b = line_endpoint(src, &xf, (s + 1) % n);
                let (mut start, end) = self.fast_segment(line, &mut entry, a, b);
                if let Some(mut prev) = carry.take() {
                    self.emit_bevel(line, &mut entry, &mut prev, &mut start);
                }
                if first_start.is_none() {
                    first_start = Some(start);
                }
                carry = Some(end);
            }
            if closed {
                if let (Some(mut prev), Some(mut first)) = (carry, first_start) {
                    self.emit_bevel(line, &mut entry, &mut prev, &mut first);
                }
            }
        } else {
            let mut path = LinePath::new();
            path.move_to(src.position(0).truncate(), src.stroke_color(0));
            for i in 1..n {
                path.line_to(src.position(i).truncate(), src.stroke_color(i));
            }
            if closed {
                path.close();
            }
            self.stroke_path(src, out, tex, params, &path);
        }
    }

    /// Tessellate the stroked edges derived from fill primitives.
    ///
    /// Edge kinds keep shared join points from being double-capped; an `End`
    /// edge returning to its run's first vertex closes the run as a loop.
    pub fn tessellate_edges(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        if src.edge_count() == 0 {
            return;
        }
        if self.use_fast_path(src, params, src.vertex_count()) {
            let xf = Transform::new(params);
            let line = &mut out.line;
            let mut entry = open_entry(&mut line.cache, params.retained);

            let mut carry: Option<SegmentEnd> = None;
            let mut first_start: Option<SegmentEnd> = None;
            let mut run_start = 0u32;
            for edge in src.edges() {
                if matches!(edge.kind, EdgeKind::Start | EdgeKind::Single) {
                    carry = None;
                    first_start = None;
                    run_start = edge.a;
                }
                let a = line_endpoint(src, &xf, edge.a as usize);
                let b = line_endpoint(src, &xf, edge.b as usize);
                let (mut start, end) = self.fast_segment(line, &mut entry, a, b);
                if matches!(edge.kind, EdgeKind::Middle | EdgeKind::End) {
                    if let Some(mut prev) = carry.take() {
                        self.emit_bevel(line, &mut entry, &mut prev, &mut start);
                    }
                }
                if first_start.is_none() {
                    first_start = Some(start);
                }
                carry = Some(end);

                if edge.kind == EdgeKind::End && edge.b == run_start {
                    if let (Some(mut prev), Some(mut first)) = (carry.take(), first_start.take()) {
                        self.emit_bevel(line, &mut entry, &mut prev, &mut first);
                    }
                }
            }
        } else {
            let mut path = LinePath::new();
            let mut run_start = 0u32;
            for edge in src.edges() {
                let a = src.position(edge.a as usize).truncate();
                let b = src.position(edge.b as usize).truncate();
                match edge.kind {
                    EdgeKind::Start | EdgeKind::Single => {
                        run_start = edge.a;
                        path.move_to(a, src.stroke_color(edge.a as usize));
                        path.line_to(b, src.stroke_color(edge.b as usize));
                    }
                    EdgeKind::Middle => {
                        path.line_to(b, src.stroke_color(edge.b as usize));
                    }
                    EdgeKind::End => {
                        path.line_to(b, src.stroke_color(edge.b as usize));
                        if edge.b == run_start {
                            path.close();
                        }
                    }
                }
            }
            self.stroke_path(src, out, tex, params, &path);
        }
    }

    /// Decide between the fast per-segment path and accurate stroking.
    fn use_fast_path(&self, src: &InGeometry, params: &TessParams, count: usize) -> bool {
        let pathological = count > self.config.max_accurate_stroke_vertices;
        match params.stroke_mode {
            StrokeMode::Fast => true,
            StrokeMode::Accurate => {
                if pathological {
                    tracing::debug!(
                        vertices = count,
                        limit = self.config.max_accurate_stroke_vertices,
                        "stroke path too long for accurate caps/joins; using fast path"
                    );
                }
                pathological
            }
            StrokeMode::Auto => {
                if pathological {
                    tracing::debug!(
                        vertices = count,
                        limit = self.config.max_accurate_stroke_vertices,
                        "stroke path too long for accurate caps/joins; using fast path"
                    );
                    return true;
                }
                // A fast-path expansion that could not even fit one batch is
                // handed to the accurate path, which splits naturally.
                if 4 * count > self.config.max_batch_vertices {
                    return false;
                }
                let weight = max_stroke_weight(src);
                scale_factor(params) * weight < self.config.min_caps_joins_weight
            }
        }
    }

    /// Expand a polyline path through the stroker and fill the outline into
    /// the polygon stream.
    fn stroke_path(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        path: &LinePath,
    ) {
        let weight = if src.vertex_count() > 0 {
            src.stroke_weight(0)
        } else {
            0.0
        };
        if weight <= 0.0 {
            return;
        }
        let outline = path.stroked(weight, params.cap, params.join, params.miter_limit);
        self.fill_line_path(out, tex, params, &outline);
    }

    /// Fill a stroked outline path into the polygon stream.
    fn fill_line_path(
        &mut self,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        outline: &LinePath,
    ) {
        if outline.is_empty() {
            return;
        }

        let mut builder = lyon::path::Path::builder_with_attributes(FILL_ATTRIBUTES);
        let mut open = false;
        for command in outline.commands() {
            match command {
                LinePathCommand::MoveTo(p, color) => {
                    if open {
                        builder.end(false);
                    }
                    builder.begin(point(p.x, p.y), &outline_attributes(color));
                    open = true;
                }
                LinePathCommand::LineTo(p, color) => {
                    builder.line_to(point(p.x, p.y), &outline_attributes(color));
                }
                LinePathCommand::Close => {
                    builder.end(true);
                    open = false;
                }
            }
        }
        if open {
            builder.end(false);
        }
        let path = builder.build();

        let mut buffers: VertexBuffers<PolyVertexData, u32> = VertexBuffers::new();
        let options =
            FillOptions::default().with_fill_rule(convert_fill_rule(outline.winding()));
        let result = self.fill.tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |mut vertex: LyonFillVertex| {
                poly_vertex_from_fill(&mut vertex)
            }),
        );
        if let Err(err) = result {
            tracing::warn!("Stroke outline tessellation failed: {:?}", err);
            return;
        }

        self.emit_poly(out, tex, params, None, &buffers.vertices, &buffers.indices);
    }

    // ------------------------------------------------------------------
    // Fills with known index structure

    /// Tessellate input vertices as explicit triangles (three per face).
    pub fn tessellate_triangles(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let n = src.vertex_count() - src.vertex_count() % 3;
        let raw: Vec<u32> = (0..n as u32).collect();
        let vertices = collect_input(src);
        self.emit_poly(out, tex, params, params.texture, &vertices, &raw);
    }

    /// Tessellate explicitly indexed triangles.
    ///
    /// Out-of-range indices and partial triangles are contract violations
    /// and fail the whole call before anything is emitted.
    pub fn tessellate_triangles_indexed(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        indices: &[u32],
    ) -> Result<(), GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle {
                index_count: indices.len(),
            });
        }
        let n = src.vertex_count();
        for &index in indices {
            if index as usize >= n {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    vertex_count: n,
                });
            }
        }
        let vertices = collect_input(src);
        self.emit_poly(out, tex, params, params.texture, &vertices, indices);
        Ok(())
    }

    /// Tessellate input vertices as a triangle fan around the first vertex.
    pub fn tessellate_triangle_fan(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let n = src.vertex_count();
        if n < 3 {
            return;
        }
        let mut raw = Vec::with_capacity(3 * (n - 2));
        for i in 1..n as u32 - 1 {
            raw.extend_from_slice(&[0, i, i + 1]);
        }
        let vertices = collect_input(src);
        self.emit_poly(out, tex, params, params.texture, &vertices, &raw);
    }

    /// Tessellate input vertices as a triangle strip.
    pub fn tessellate_triangle_strip(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let n = src.vertex_count();
        if n < 3 {
            return;
        }
        let mut raw = Vec::with_capacity(3 * (n - 2));
        for i in 2..n as u32 {
            if i % 2 == 0 {
                raw.extend_from_slice(&[i - 2, i - 1, i]);
            } else {
                raw.extend_from_slice(&[i - 1, i - 2, i]);
            }
        }
        let vertices = collect_input(src);
        self.emit_poly(out, tex, params, params.texture, &vertices, &raw);
    }

    /// Tessellate input vertices as quads (four per face).
    pub fn tessellate_quads(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let quads = src.vertex_count() / 4;
        let mut raw = Vec::with_capacity(6 * quads);
        for q in 0..quads as u32 {
            let i = 4 * q;
            raw.extend_from_slice(&[i, i + 1, i + 2, i, i + 2, i + 3]);
        }
        let vertices = collect_input(src);
        self.emit_poly(out, tex, params, params.texture, &vertices, &raw);
    }

    /// Tessellate input vertices as a quad strip.
    pub fn tessellate_quad_strip(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
    ) {
        let n = src.vertex_count();
        if n < 4 {
            return;
        }
        let mut raw = Vec::new();
        let mut qd = 3u32;
        while (qd as usize) < n {
            let (i0, i1, i2, i3) = (qd - 3, qd - 2, qd, qd - 1);
            raw.extend_from_slice(&[i0, i1, i2, i0, i2, i3]);
            qd += 2;
        }
        let vertices = collect_input(src);
        self.emit_poly(out, tex, params, params.texture, &vertices, &raw);
    }

    // ------------------------------------------------------------------
    // General polygons

    /// Tessellate input vertices as a general polygon, one contour per
    /// break boundary, delegating decomposition to the sweep tessellator.
    ///
    /// Self-intersection failures are reported as warnings and leave the
    /// shape's fill incomplete; the call itself succeeds.
    pub fn tessellate_polygon(
        &mut self,
        src: &InGeometry,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        closed: bool,
    ) {
        let n = src.vertex_count();
        if n < 3 {
            return;
        }

        let mut builder = lyon::path::Path::builder_with_attributes(FILL_ATTRIBUTES);
        let mut open = false;
        for i in 0..n {
            let p = src.position(i);
            let attributes = input_attributes(src, i);
            if i == 0 || src.breaks_at(i) {
                if open {
                    builder.end(closed);
                }
                builder.begin(point(p.x, p.y), &attributes);
                open = true;
            } else {
                builder.line_to(point(p.x, p.y), &attributes);
            }
        }
        if open {
            builder.end(closed);
        }
        let path = builder.build();

        let mut buffers: VertexBuffers<PolyVertexData, u32> = VertexBuffers::new();
        let options = FillOptions::default().with_fill_rule(convert_fill_rule(params.winding));
        let result = self.fill.tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |mut vertex: LyonFillVertex| {
                poly_vertex_from_fill(&mut vertex)
            }),
        );
        if let Err(err) = result {
            tracing::warn!("Polygon tessellation failed: {:?}", err);
            return;
        }

        self.emit_poly(out, tex, params, params.texture, &buffers.vertices, &buffers.indices);
    }

    // ------------------------------------------------------------------
    // Batch emission

    /// Write a triangle list into the polygon stream, splitting it into
    /// index-safe batches and recording the texture run it covers.
    fn emit_poly(
        &mut self,
        out: &mut TessGeometry,
        tex: &mut TexCache,
        params: &TessParams,
        texture: Option<TextureId>,
        vertices: &[PolyVertexData],
        raw: &[u32],
    ) {
        if raw.is_empty() {
            return;
        }
        let xf = Transform::new(params);
        let poly = &mut out.poly;
        let first_tex_index = poly.index_count();

        let batches = split_raw_indices(raw, self.config.max_batch_vertices);
        let mut entry = open_entry(&mut poly.cache, params.retained);
        let mut first_cache = entry;

        for (b, batch) in batches.iter().enumerate() {
            if b > 0
                || poly.cache.entry(entry).vertex_count + batch.vertex_count()
                    > self.config.max_batch_vertices
            {
                entry = poly.cache.add_new();
            }
            if b == 0 {
                first_cache = entry;
            }
            let base = poly.cache.entry(entry).vertex_count;
            let first_vertex = poly.vertex_count();

            for id in batch.vertex_range.clone() {
                push_poly_vertex(poly, &xf, &vertices[id as usize]);
            }
            for &id in &batch.duplicates {
                push_poly_vertex(poly, &xf, &vertices[id as usize]);
            }
            for &rel in &batch.indices {
                poly.push_index((base + rel as usize) as u16);
            }
            poly.cache
                .inc_counts(entry, batch.indices.len(), batch.vertex_count());

            if params.auto_normals {
                flat_shade_batch(poly, first_vertex, &batch.indices);
            }
        }

        tex.add_texture(
            texture,
            first_tex_index,
            first_cache,
            poly.index_count() - 1,
            entry,
        );
    }

    // ------------------------------------------------------------------
    // Fast line segments

    /// Emit one segment quad into the line stream.
    ///
    /// Returns the quad's start and end vertex pairs for join stitching.
    fn fast_segment(
        &self,
        line: &mut LineStream,
        entry: &mut usize,
        a: LineEndpoint,
        b: LineEndpoint,
    ) -> (SegmentEnd, SegmentEnd) {
        if line.cache.entry(*entry).vertex_count + 4 > self.config.max_batch_vertices {
            *entry = line.cache.add_new();
        }
        let base = line.cache.entry(*entry).vertex_count;

        let vertices = [
            (a.position, a.color, b.position.truncate().extend(a.weight / 2.0)),
            (a.position, a.color, b.position.truncate().extend(-a.weight / 2.0)),
            (b.position, b.color, a.position.truncate().extend(-b.weight / 2.0)),
            (b.position, b.color, a.position.truncate().extend(b.weight / 2.0)),
        ];
        for &(position, color, direction) in &vertices {
            line.push_vertex(position, color, direction);
        }
        for rel in [0, 1, 2, 2, 3, 0] {
            line.push_index((base + rel) as u16);
        }
        line.cache.inc_counts(*entry, 6, 4);

        let start = SegmentEnd {
            entry: *entry,
            rel: [base, base + 1],
            vertices: [vertices[0], vertices[1]],
        };
        let end = SegmentEnd {
            entry: *entry,
            rel: [base + 3, base + 2],
            vertices: [vertices[3], vertices[2]],
        };
        (start, end)
    }

    /// Stitch two segment quads with a bevel triangle pair.
    ///
    /// When a referenced pair lives in an earlier batch (the join spans a
    /// batch split), its two vertices are re-emitted into the current batch
    /// with their original attributes and the bevel indexes the copies.
    fn emit_bevel(
        &self,
        line: &mut LineStream,
        entry: &mut usize,
        prev: &mut SegmentEnd,
        next: &mut SegmentEnd,
    ) {
        if line.cache.entry(*entry).vertex_count + 4 > self.config.max_batch_vertices {
            *entry = line.cache.add_new();
        }
        for pair in [&mut *prev, &mut *next] {
            if pair.entry != *entry {
                let base = line.cache.entry(*entry).vertex_count;
                for &(position, color, direction) in &pair.vertices {
                    line.push_vertex(position, color, direction);
                }
                line.cache.inc_counts(*entry, 0, 2);
                pair.entry = *entry;
                pair.rel = [base, base + 1];
            }
        }
        for rel in [
            prev.rel[0],
            prev.rel[1],
            next.rel[0],
            prev.rel[1],
            next.rel[0],
            next.rel[1],
        ] {
            line.push_index(rel as u16);
        }
        line.cache.inc_counts(*entry, 6, 0);
    }
}

// ----------------------------------------------------------------------
// Support types

/// Transformed endpoint data for the fast line path.
#[derive(Debug, Clone, Copy)]
struct LineEndpoint {
    position: Vec4,
    color: u32,
    weight: f32,
}

fn line_endpoint(src: &InGeometry, xf: &Transform, i: usize) -> LineEndpoint {
    LineEndpoint {
        position: xf.position(src.position(i)),
        color: src.stroke_color(i),
        weight: src.stroke_weight(i),
    }
}

/// The two line-stream vertices flanking a segment endpoint, kept for join
/// stitching across segments and batch splits.
#[derive(Debug, Clone, Copy)]
struct SegmentEnd {
    entry: usize,
    rel: [usize; 2],
    vertices: [(Vec4, u32, Vec4); 2],
}

/// One fully-attributed polygon-stream vertex before transform.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PolyVertexData {
    position: Vec3,
    color: u32,
    normal: Vec3,
    uv: Vec2,
    ambient: u32,
    specular: u32,
    emissive: u32,
    shininess: f32,
}

#[derive(Debug, Clone, Copy)]
struct Transform {
    matrix: Option<Mat4>,
    normal_matrix: Option<Mat3>,
}

impl Transform {
    fn new(params: &TessParams) -> Self {
        let matrix = params.transform;
        let normal_matrix = matrix.map(|m| Mat3::from_mat4(m).inverse().transpose());
        Self {
            matrix,
            normal_matrix,
        }
    }

    fn position(&self, p: Vec3) -> Vec4 {
        match self.matrix {
            Some(m) => m * p.extend(1.0),
            None => p.extend(1.0),
        }
    }

    fn normal(&self, n: Vec3) -> Vec3 {
        match self.normal_matrix {
            Some(m) => (m * n).normalize_or_zero(),
            None => n,
        }
    }
}

/// Uniform scaling applied by the transform: cube root of the volume change
/// in 3D, square root of the area change in 2D.
fn scale_factor(params: &TessParams) -> f32 {
    match params.transform {
        None => 1.0,
        Some(m) => {
            if params.is_3d {
                m.determinant().abs().cbrt()
            } else {
                (m.x_axis.x * m.y_axis.y - m.y_axis.x * m.x_axis.y)
                    .abs()
                    .sqrt()
            }
        }
    }
}

fn max_stroke_weight(src: &InGeometry) -> f32 {
    (0..src.vertex_count())
        .map(|i| src.stroke_weight(i))
        .fold(0.0, f32::max)
}

fn open_entry(cache: &mut crate::index_cache::IndexCache, retained: bool) -> usize {
    if retained {
        cache.add_new()
    } else {
        cache.get_last()
    }
}

fn collect_input(src: &InGeometry) -> Vec<PolyVertexData> {
    (0..src.vertex_count())
        .map(|i| PolyVertexData {
            position: src.position(i),
            color: src.fill_color(i),
            normal: src.normal(i),
            uv: src.uv(i),
            ambient: src.ambient(i),
            specular: src.specular(i),
            emissive: src.emissive(i),
            shininess: src.shininess(i),
        })
        .collect()
}

fn point_poly_vertex(position: Vec3, color: u32) -> PolyVertexData {
    PolyVertexData {
        position,
        color,
        normal: Vec3::Z,
        uv: Vec2::ZERO,
        ambient: 0,
        specular: 0,
        emissive: 0,
        shininess: 0.0,
    }
}

/// Attribute payload for a fill-path endpoint read from input geometry.
fn input_attributes(src: &InGeometry, i: usize) -> [f32; FILL_ATTRIBUTES] {
    let fill = Color::from_packed(src.fill_color(i)).to_array();
    let normal = src.normal(i);
    let uv = src.uv(i);
    let ambient = Color::from_packed(src.ambient(i)).to_array();
    let specular = Color::from_packed(src.specular(i)).to_array();
    let emissive = Color::from_packed(src.emissive(i)).to_array();
    [
        src.position(i).z,
        fill[0],
        fill[1],
        fill[2],
        fill[3],
        normal.x,
        normal.y,
        normal.z,
        uv.x,
        uv.y,
        ambient[0],
        ambient[1],
        ambient[2],
        ambient[3],
        specular[0],
        specular[1],
        specular[2],
        specular[3],
        emissive[0],
        emissive[1],
        emissive[2],
        emissive[3],
        src.shininess(i),
    ]
}

/// Attribute payload for a stroke-outline endpoint: the stroke color rides
/// in the fill slots, everything else is flat.
fn outline_attributes(color: u32) -> [f32; FILL_ATTRIBUTES] {
    let stroke = Color::from_packed(color).to_array();
    let mut attributes = [0.0; FILL_ATTRIBUTES];
    attributes[1..5].copy_from_slice(&stroke);
    attributes[7] = 1.0;
    attributes
}

/// Build a polygon vertex from an emitted fill vertex, re-normalizing the
/// interpolated normal (a linear blend of unit normals is not unit length).
fn poly_vertex_from_fill(vertex: &mut LyonFillVertex) -> PolyVertexData {
    let position = vertex.position();
    let a = vertex.interpolated_attributes();
    PolyVertexData {
        position: Vec3::new(position.x, position.y, a[0]),
        color: Color::rgba(a[1], a[2], a[3], a[4]).packed(),
        normal: Vec3::new(a[5], a[6], a[7]).normalize_or_zero(),
        uv: Vec2::new(a[8], a[9]),
        ambient: Color::rgba(a[10], a[11], a[12], a[13]).packed(),
        specular: Color::rgba(a[14], a[15], a[16], a[17]).packed(),
        emissive: Color::rgba(a[18], a[19], a[20], a[21]).packed(),
        shininess: a[22],
    }
}

fn push_poly_vertex(poly: &mut PolyStream, xf: &Transform, vertex: &PolyVertexData) {
    poly.push_vertex(
        xf.position(vertex.position),
        vertex.color,
        xf.normal(vertex.normal),
        vertex.uv,
        vertex.ambient,
        vertex.specular,
        vertex.emissive,
        vertex.shininess,
    );
}

/// Overwrite the normals of a freshly-emitted batch with flat per-face
/// normals computed from the transformed positions.
fn flat_shade_batch(poly: &mut PolyStream, first_vertex: usize, relative_indices: &[u16]) {
    for tri in relative_indices.chunks_exact(3) {
        let i0 = first_vertex + tri[0] as usize;
        let i1 = first_vertex + tri[1] as usize;
        let i2 = first_vertex + tri[2] as usize;
        let v0 = poly.positions()[i0].truncate();
        let v1 = poly.positions()[i1].truncate();
        let v2 = poly.positions()[i2].truncate();
        let normal = (v2 - v1).cross(v0 - v1).normalize_or_zero();
        poly.set_normal(i0, normal);
        poly.set_normal(i1, normal);
        poly.set_normal(i2, normal);
    }
}

fn convert_fill_rule(rule: FillRule) -> lyon::lyon_tessellation::FillRule {
    match rule {
        FillRule::NonZero => lyon::lyon_tessellation::FillRule::NonZero,
        FillRule::EvenOdd => lyon::lyon_tessellation::FillRule::EvenOdd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VertexStyle, tables::SphereTable};

    fn style() -> VertexStyle {
        VertexStyle::default()
    }

    fn setup() -> (InGeometry, TessGeometry, TexCache) {
        (InGeometry::new(), TessGeometry::new(), TexCache::new())
    }

    /// Every index stored for every cache entry must stay inside that
    /// entry's vertex count.
    fn assert_index_safety(indices: &[u16], cache: &crate::index_cache::IndexCache) {
        for entry in cache.entries() {
            for i in entry.index_offset..entry.index_offset + entry.index_count {
                assert!(
                    (indices[i] as usize) < entry.vertex_count,
                    "index {} out of range for entry with {} vertices",
                    indices[i],
                    entry.vertex_count
                );
            }
        }
    }

    #[test]
    fn test_round_point_vertex_count_floor() {
        let (mut src, mut out, mut tex) = setup();
        src.add_point(Vec3::ZERO, &style().with_stroke_weight(10.0));

        let params = TessParams::default().with_3d(true);
        let mut tess = Tessellator::new();
        tess.tessellate_points(&src, &mut out, &mut tex, &params);

        // round(2π·10 / 10) = 6 < 20, so the floor applies: 20 + 1 vertices.
        assert_eq!(out.point.vertex_count(), 21);
        assert_eq!(out.point.index_count(), 3 * 20);
    }

    #[test]
    fn test_round_point_vertex_count_formula() {
        let (mut src, mut out, mut tex) = setup();
        src.add_point(Vec3::ZERO, &style().with_stroke_weight(50.0));

        let params = TessParams::default().with_3d(true);
        let mut tess = Tessellator::new();
        tess.tessellate_points(&src, &mut out, &mut tex, &params);

        // round(2π·50 / 10) = 31 dominates the floor of 20.
        assert_eq!(out.point.vertex_count(), 31 + 1);
        assert_eq!(out.point.index_count(), 3 * 31);
    }

    #[test]
    fn test_square_point_is_five_vertex_fan() {
        let (mut src, mut out, mut tex) = setup();
        src.add_point(Vec3::ZERO, &style().with_stroke_weight(8.0));

        let params = TessParams::default().with_3d(true).with_cap(LineCap::Square);
        let mut tess = Tessellator::new();
        tess.tessellate_points(&src, &mut out, &mut tex, &params);

        assert_eq!(out.point.vertex_count(), 5);
        assert_eq!(out.point.index_count(), 12);
        // Offsets are the signed unit-square corners scaled by half weight.
        assert_eq!(out.point.offsets()[1], Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_point_2d_bakes_offsets_into_poly_stream() {
        let (mut src, mut out, mut tex) = setup();
        src.add_point(Vec3::new(10.0, 20.0, 0.0), &style().with_stroke_weight(30.0));

        let params = TessParams::default();
        let mut tess = Tessellator::new();
        tess.tessellate_points(&src, &mut out, &mut tex, &params);

        assert_eq!(out.point.vertex_count(), 0);
        assert!(out.poly.vertex_count() > 1);
        // Fan vertices are displaced from the center in position, not via
        // an offset attribute.
        let center = out.poly.positions()[0];
        let rim = out.poly.positions()[1];
        assert!((rim.truncate() - center.truncate()).length() > 1.0);
        assert_index_safety(out.poly.indices(), &out.poly.cache);
    }

    #[test]
    fn test_fast_path_below_caps_joins_weight() {
        let (mut src, mut out, mut tex) = setup();
        let thin = style().with_stroke_weight(1.9);
        src.add_vertex(Vec3::ZERO, &thin, true);
        src.add_vertex(Vec3::new(10.0, 0.0, 0.0), &thin, false);
        src.add_vertex(Vec3::new(10.0, 10.0, 0.0), &thin, false);

        let params = TessParams::default();
        let mut tess = Tessellator::new();
        tess.tessellate_line_strip(&src, &mut out, &mut tex, &params);

        // One quad per segment plus bevel triangles, nothing in the poly
        // stream.
        assert_eq!(out.line.vertex_count(), 2 * 4);
        assert_eq!(out.line.index_count(), 2 * 6 + 6);
        assert!(out.poly.is_empty());
    }

    #[test]
    fn test_accurate_path_above_caps_joins_weight() {
        let (mut src, mut out, mut tex) = setup();
        let thick = style().with_stroke_weight(2.1);
        src.add_vertex(Vec3::ZERO, &thick, true);
        src.add_vertex(Vec3::new(10.0, 0.0, 0.0), &thick, false);
        src.add_vertex(Vec3::new(10.0, 10.0, 0.0), &thick, false);

        let params = TessParams::default();
        let mut tess = Tessellator::new();
        tess.tessellate_line_strip(&src, &mut out, &mut tex, &params);

        assert!(out.line.is_empty());
        assert!(!out.poly.is_empty());
        assert_index_safety(out.poly.indices(), &out.poly.cache);
    }

    #[test]
    fn test_pathological_stroke_falls_back_to_fast() {
        let (mut src, mut out, mut tex) = setup();
        let thick = style().with_stroke_weight(10.0);
        for i in 0..40 {
            src.add_vertex(Vec3::new(i as f32, (i % 2) as f32, 0.0), &thick, i == 0);
        }

        let config = TessellatorConfig::default().with_max_accurate_stroke_vertices(32);
        let mut tess = Tessellator::with_config(config);
        let params = TessParams::default();
        tess.tessellate_line_strip(&src, &mut out, &mut tex, &params);

        assert!(!out.line.is_empty());
        assert!(out.poly.is_empty());
    }

    #[test]
    fn test_quad_tessellates_to_two_triangles_same_area() {
        let (mut src, mut out, mut tex) = setup();
        src.add_quad(
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            &style(),
            false,
        );

        let mut tess = Tessellator::new();
        tess.tessellate_quads(&src, &mut out, &mut tex, &TessParams::default());

        assert_eq!(out.poly.vertex_count(), 4);
        assert_eq!(out.poly.index_count(), 6);
        assert!((signed_area(&out.poly) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_convex_polygon_triangle_count_and_area() {
        let (mut src, mut out, mut tex) = setup();
        let n = 8;
        for i in 0..n {
            let theta = std::f32::consts::TAU * i as f32 / n as f32;
            src.add_vertex(
                Vec3::new(theta.cos() * 10.0, theta.sin() * 10.0, 0.0),
                &style(),
                i == 0,
            );
        }

        let mut tess = Tessellator::new();
        tess.tessellate_polygon(&src, &mut out, &mut tex, &TessParams::default(), true);

        // A convex n-gon decomposes into exactly n - 2 triangles.
        assert_eq!(out.poly.index_count(), 3 * (n - 2));
        let expected_area = 0.5 * n as f32 * 10.0 * 10.0 * (std::f32::consts::TAU / n as f32).sin();
        assert!((signed_area(&out.poly) - expected_area).abs() < 1e-2);
        assert_index_safety(out.poly.indices(), &out.poly.cache);
    }

    #[test]
    fn test_polygon_interpolates_attributes_at_intersections() {
        let (mut src, mut out, mut tex) = setup();
        // A self-intersecting bowtie: the crossing point is synthesized by
        // the sweep tessellator and must blend the endpoint colors.
        let red = style().with_fill(crate::Color::RED);
        let green = style().with_fill(crate::Color::GREEN);
        src.add_vertex(Vec3::ZERO, &red, true);
        src.add_vertex(Vec3::new(10.0, 10.0, 0.0), &red, false);
        src.add_vertex(Vec3::new(10.0, 0.0, 0.0), &green, false);
        src.add_vertex(Vec3::new(0.0, 10.0, 0.0), &green, false);

        let mut tess = Tessellator::new();
        tess.tessellate_polygon(&src, &mut out, &mut tex, &TessParams::default(), true);

        assert!(!out.poly.is_empty());
        // The synthesized vertex sits at the crossing (5, 5).
        let crossing = out
            .poly
            .positions()
            .iter()
            .position(|p| (p.truncate() - Vec3::new(5.0, 5.0, 0.0)).length() < 1e-3);
        assert!(crossing.is_some());
    }

    #[test]
    fn test_raw_split_preserves_attributes() {
        let (mut src, mut out, mut tex) = setup();
        // A strip over 12 vertices with a tiny batch ceiling must split and
        // duplicate shared vertices bit-for-bit.
        for i in 0..12 {
            let shade = i as f32 / 11.0;
            src.add_vertex(
                Vec3::new(i as f32, (i % 2) as f32, 0.0),
                &style().with_fill(crate::Color::rgba(shade, 0.5, 1.0 - shade, 1.0)),
                i == 0,
            );
        }

        let config = TessellatorConfig::default().with_max_batch_vertices(8);
        let mut tess = Tessellator::with_config(config);
        tess.tessellate_triangle_strip(&src, &mut out, &mut tex, &TessParams::default());

        assert!(out.poly.cache.len() >= 2);
        assert_index_safety(out.poly.indices(), &out.poly.cache);

        // Resolve every emitted triangle and match it against a source
        // triangle with identical position and color.
        let mut remaining: Vec<[u32; 3]> = (2..12u32)
            .map(|i| {
                if i % 2 == 0 {
                    [i - 2, i - 1, i]
                } else {
                    [i - 1, i - 2, i]
                }
            })
            .collect();
        for entry in out.poly.cache.entries() {
            for tri in out.poly.indices()[entry.index_offset..entry.index_offset + entry.index_count]
                .chunks_exact(3)
            {
                let resolved: Vec<(Vec4, u32)> = tri
                    .iter()
                    .map(|&rel| {
                        let v = entry.vertex_offset + rel as usize;
                        (out.poly.positions()[v], out.poly.colors()[v])
                    })
                    .collect();
                let found = remaining.iter().position(|ids| {
                    ids.iter().zip(&resolved).all(|(&id, &(p, c))| {
                        p == src.position(id as usize).extend(1.0)
                            && c == src.fill_color(id as usize)
                    })
                });
                let found = found.expect("emitted triangle must match a source triangle");
                remaining.remove(found);
            }
        }
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_fast_strip_bevel_survives_batch_split() {
        let (mut src, mut out, mut tex) = setup();
        let thin = style().with_stroke_weight(1.0);
        for i in 0..12 {
            src.add_vertex(Vec3::new(i as f32, (i % 3) as f32, 0.0), &thin, i == 0);
        }

        // Room for two quads per batch; joins repeatedly span splits.
        let config = TessellatorConfig::default().with_max_batch_vertices(8);
        let mut tess = Tessellator::with_config(config);
        tess.tessellate_line_strip(&src, &mut out, &mut tex, &TessParams::default());

        assert!(out.line.cache.len() >= 2);
        assert_index_safety(out.line.indices(), &out.line.cache);
    }

    #[test]
    fn test_indexed_triangles_contract_violations() {
        let (mut src, mut out, mut tex) = setup();
        src.add_triangle(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            &style(),
            false,
        );

        let mut tess = Tessellator::new();
        let err = tess
            .tessellate_triangles_indexed(&src, &mut out, &mut tex, &TessParams::default(), &[0, 1])
            .unwrap_err();
        assert!(matches!(err, GeometryError::PartialTriangle { .. }));

        let err = tess
            .tessellate_triangles_indexed(
                &src,
                &mut out,
                &mut tex,
                &TessParams::default(),
                &[0, 1, 9],
            )
            .unwrap_err();
        assert!(matches!(err, GeometryError::IndexOutOfRange { index: 9, .. }));
        // Nothing was emitted by the failed calls.
        assert!(out.poly.is_empty());
    }

    #[test]
    fn test_texture_runs_coalesce_across_calls() {
        let (mut src, mut out, mut tex) = setup();
        src.add_rect(Vec2::ZERO, Vec2::splat(10.0), &style(), false);

        let mut tess = Tessellator::new();
        let params = TessParams::default().with_texture(TextureId(3));
        tess.tessellate_quads(&src, &mut out, &mut tex, &params);

        src.clear();
        src.add_rect(Vec2::splat(20.0), Vec2::splat(30.0), &style(), false);
        tess.tessellate_quads(&src, &mut out, &mut tex, &params);

        assert_eq!(tex.len(), 1);
        assert_eq!(tex.entry(0).first_index, 0);
        assert_eq!(tex.entry(0).last_index, out.poly.index_count() - 1);
    }

    #[test]
    fn test_retained_shapes_get_fresh_cache_entries() {
        let (mut src, mut out, mut tex) = setup();
        src.add_rect(Vec2::ZERO, Vec2::splat(10.0), &style(), false);

        let mut tess = Tessellator::new();
        let params = TessParams::default().retained();
        tess.tessellate_quads(&src, &mut out, &mut tex, &params);
        tess.tessellate_quads(&src, &mut out, &mut tex, &params);

        assert_eq!(out.poly.cache.len(), 2);
        // Immediate mode keeps filling the last entry instead.
        let immediate = TessParams::default();
        tess.tessellate_quads(&src, &mut out, &mut tex, &immediate);
        assert_eq!(out.poly.cache.len(), 2);
    }

    #[test]
    fn test_tessellation_is_deterministic() {
        let build = |src: &mut InGeometry| {
            src.add_ellipse(Vec2::splat(50.0), Vec2::splat(20.0), 1.0, &style(), true);
        };

        let run = |src: &InGeometry| {
            let mut out = TessGeometry::new();
            let mut tex = TexCache::new();
            let mut tess = Tessellator::new();
            tess.tessellate_triangle_fan(src, &mut out, &mut tex, &TessParams::default());
            tess.tessellate_edges(src, &mut out, &mut tex, &TessParams::default());
            out
        };

        let mut src = InGeometry::new();
        build(&mut src);
        let first = run(&src);

        src.clear();
        build(&mut src);
        let second = run(&src);

        assert_eq!(first.poly.position_bytes(), second.poly.position_bytes());
        assert_eq!(first.poly.color_bytes(), second.poly.color_bytes());
        assert_eq!(first.poly.index_bytes(), second.poly.index_bytes());
        assert_eq!(first.line.position_bytes(), second.line.position_bytes());
        assert_eq!(first.line.index_bytes(), second.line.index_bytes());
    }

    #[test]
    fn test_transform_is_applied_and_explicit() {
        let (mut src, mut out, mut tex) = setup();
        src.add_rect(Vec2::ZERO, Vec2::splat(10.0), &style(), false);

        let transform = Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0));
        let params = TessParams::default().with_transform(transform);
        let mut tess = Tessellator::new();
        tess.tessellate_quads(&src, &mut out, &mut tex, &params);

        assert_eq!(out.poly.positions()[0], Vec4::new(100.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_sphere_triangles_through_raw_split() {
        let (mut src, mut out, mut tex) = setup();
        let table = SphereTable::new(16, 12);
        src.add_sphere(10.0, &table, &style(), false);

        let config = TessellatorConfig::default().with_max_batch_vertices(256);
        let mut tess = Tessellator::with_config(config);
        tess.tessellate_triangles(&src, &mut out, &mut tex, &TessParams::default());

        assert!(out.poly.cache.len() >= 2);
        assert_index_safety(out.poly.indices(), &out.poly.cache);
        assert_eq!(out.poly.index_count(), src.vertex_count());
    }

    fn signed_area(poly: &PolyStream) -> f32 {
        let mut area = 0.0;
        for entry in poly.cache.entries() {
            for tri in poly.indices()[entry.index_offset..entry.index_offset + entry.index_count]
                .chunks_exact(3)
            {
                let p0 = poly.positions()[entry.vertex_offset + tri[0] as usize];
                let p1 = poly.positions()[entry.vertex_offset + tri[1] as usize];
                let p2 = poly.positions()[entry.vertex_offset + tri[2] as usize];
                let a = Vec2::new(p1.x - p0.x, p1.y - p0.y);
                let b = Vec2::new(p2.x - p0.x, p2.y - p0.y);
                area += 0.5 * (a.x * b.y - a.y * b.x);
            }
        }
        area.abs()
    }
}
