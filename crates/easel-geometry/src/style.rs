//! Styling inputs for tessellation: caps, joins, winding, per-vertex
//! attributes and the per-call parameter block.

use crate::{Color, TextureId};
use glam::{Mat4, Vec2, Vec3};

/// Line cap style for stroke endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat cap ending at the endpoint.
    Butt,
    /// Round cap extending beyond the endpoint.
    #[default]
    Round,
    /// Square cap extending beyond the endpoint.
    Square,
}

/// Line join style for stroke corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Miter join (sharp corner).
    #[default]
    Miter,
    /// Round join (rounded corner).
    Round,
    /// Bevel join (flat corner).
    Bevel,
}

/// Winding rule for determining the interior of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Non-zero winding rule (default).
    #[default]
    NonZero,
    /// Even-odd (parity) rule.
    EvenOdd,
}

/// How an arc's endpoints are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcMode {
    /// Fill the region the perimeter encloses; stroke the arc only, leaving
    /// the endpoints uncapped towards each other.
    #[default]
    Open,
    /// Close the perimeter with a straight chord, filled and stroked.
    Chord,
    /// Connect both endpoints to the center, filled and stroked as a wedge.
    Pie,
}

/// Stroke quality selection for line tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeMode {
    /// Pick per call: accurate caps/joins once the on-screen stroke weight
    /// is large enough to make them visible.
    #[default]
    Auto,
    /// Always use the per-segment quad path, ignoring caps and joins.
    Fast,
    /// Always expand strokes through the path offsetter.
    Accurate,
}

/// Attribute bundle applied to appended input vertices.
///
/// The drawing layer keeps one of these as its current style and passes it
/// down with every append call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexStyle {
    pub fill: Color,
    pub normal: Vec3,
    pub uv: Vec2,
    pub stroke: Color,
    pub stroke_weight: f32,
    pub ambient: Color,
    pub specular: Color,
    pub emissive: Color,
    pub shininess: f32,
}

impl VertexStyle {
    /// Set the fill color.
    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }

    /// Set the stroke color.
    pub fn with_stroke(mut self, stroke: Color) -> Self {
        self.stroke = stroke;
        self
    }

    /// Set the stroke weight.
    pub fn with_stroke_weight(mut self, weight: f32) -> Self {
        self.stroke_weight = weight.max(0.0);
        self
    }

    /// Set the vertex normal.
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    /// Set the texture coordinate.
    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = uv;
        self
    }
}

impl Default for VertexStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
            stroke: Color::BLACK,
            stroke_weight: 1.0,
            ambient: Color::BLACK,
            specular: Color::BLACK,
            emissive: Color::BLACK,
            shininess: 1.0,
        }
    }
}

/// Per-call tessellation parameters.
///
/// Everything that used to be ambient renderer state is passed explicitly:
/// the model transform, the 2D/3D routing decision, winding, texture and
/// stroke configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessParams {
    /// Model transform pre-multiplied into emitted positions, or `None` for
    /// identity.
    pub transform: Option<Mat4>,
    /// 3D mode stores point billboards in the point stream; 2D mode bakes
    /// their offsets into positions and uses the polygon stream.
    pub is_3d: bool,
    /// Winding rule for polygon fills.
    pub winding: FillRule,
    /// Texture bound while this geometry is drawn, recorded in the TexCache.
    pub texture: Option<TextureId>,
    /// Stroke endpoint caps. Round caps also select round points.
    pub cap: LineCap,
    /// Stroke corner joins.
    pub join: LineJoin,
    /// Miter limit for miter joins.
    pub miter_limit: f32,
    /// Retained shapes always open fresh index batches so they stay
    /// independently redrawable; immediate shapes may extend the last batch.
    pub retained: bool,
    /// Stroke quality selection.
    pub stroke_mode: StrokeMode,
    /// Overwrite vertex normals with flat per-face normals on fills.
    pub auto_normals: bool,
}

impl TessParams {
    /// Set the model transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Select 3D output routing.
    pub fn with_3d(mut self, is_3d: bool) -> Self {
        self.is_3d = is_3d;
        self
    }

    /// Set the winding rule for fills.
    pub fn with_winding(mut self, winding: FillRule) -> Self {
        self.winding = winding;
        self
    }

    /// Set the texture recorded for fills.
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Set the stroke cap style.
    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    /// Set the stroke join style.
    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    /// Set the miter limit.
    pub fn with_miter_limit(mut self, limit: f32) -> Self {
        self.miter_limit = limit.max(1.0);
        self
    }

    /// Mark the shape as retained.
    pub fn retained(mut self) -> Self {
        self.retained = true;
        self
    }

    /// Set the stroke quality selection.
    pub fn with_stroke_mode(mut self, mode: StrokeMode) -> Self {
        self.stroke_mode = mode;
        self
    }

    /// Enable flat per-face normals on fills.
    pub fn with_auto_normals(mut self) -> Self {
        self.auto_normals = true;
        self
    }
}

impl Default for TessParams {
    fn default() -> Self {
        Self {
            transform: None,
            is_3d: false,
            winding: FillRule::NonZero,
            texture: None,
            cap: LineCap::Round,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            retained: false,
            stroke_mode: StrokeMode::Auto,
            auto_normals: false,
        }
    }
}
