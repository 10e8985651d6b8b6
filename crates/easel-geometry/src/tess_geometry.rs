//! Tessellated output streams: GPU attribute arrays plus batch accounting.
//!
//! Three independent streams — polygon, line and point — each hold a
//! structure-of-arrays of GPU-layout attributes, a `u16` index array and one
//! [`IndexCache`]. Index values are relative to their cache entry's vertex
//! offset. Modified-range bookkeeping lets a buffer-upload layer sync only
//! what changed since the last frame.

use crate::index_cache::IndexCache;
use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};
use std::ops::Range;

bitflags! {
    /// Attribute channels touched since the consumer last synced buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Channels: u32 {
        const POSITION = 1 << 0;
        const COLOR = 1 << 1;
        const NORMAL = 1 << 2;
        const UV = 1 << 3;
        const MATERIAL = 1 << 4;
        const DIRECTION = 1 << 5;
        const OFFSET = 1 << 6;
        const INDEX = 1 << 7;
    }
}

/// Inclusive low/high watermark of modified elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ModifiedRange {
    first: usize,
    last: usize,
    any: bool,
}

impl ModifiedRange {
    fn mark(&mut self, index: usize) {
        if self.any {
            self.first = self.first.min(index);
            self.last = self.last.max(index);
        } else {
            self.first = index;
            self.last = index;
            self.any = true;
        }
    }

    fn take(&mut self) -> Option<Range<usize>> {
        if self.any {
            let range = self.first..self.last + 1;
            *self = Self::default();
            Some(range)
        } else {
            None
        }
    }
}

/// Pending buffer work reported by [`PolyStream::take_sync`] and friends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSync {
    /// Which attribute arrays changed.
    pub channels: Channels,
    /// Modified vertex range, if any.
    pub vertices: Option<Range<usize>>,
    /// Modified index range, if any.
    pub indices: Option<Range<usize>>,
}

/// Filled-geometry output stream.
#[derive(Debug, Clone, Default)]
pub struct PolyStream {
    positions: Vec<Vec4>,
    colors: Vec<u32>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    ambient: Vec<u32>,
    specular: Vec<u32>,
    emissive: Vec<u32>,
    shininess: Vec<f32>,
    indices: Vec<u16>,
    pub cache: IndexCache,
    dirty: Channels,
    vertex_mod: ModifiedRange,
    index_mod: ModifiedRange,
}

impl PolyStream {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn ambient(&self) -> &[u32] {
        &self.ambient
    }

    pub fn specular(&self) -> &[u32] {
        &self.specular
    }

    pub fn emissive(&self) -> &[u32] {
        &self.emissive
    }

    pub fn shininess(&self) -> &[f32] {
        &self.shininess
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Position data as bytes, ready for buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn push_vertex(
        &mut self,
        position: Vec4,
        color: u32,
        normal: Vec3,
        uv: Vec2,
        ambient: u32,
        specular: u32,
        emissive: u32,
        shininess: f32,
    ) {
        let i = self.positions.len();
        self.positions.push(position);
        self.colors.push(color);
        self.normals.push(normal);
        self.uvs.push(uv);
        self.ambient.push(ambient);
        self.specular.push(specular);
        self.emissive.push(emissive);
        self.shininess.push(shininess);
        self.dirty |= Channels::POSITION
            | Channels::COLOR
            | Channels::NORMAL
            | Channels::UV
            | Channels::MATERIAL;
        self.vertex_mod.mark(i);
    }

    pub(crate) fn push_index(&mut self, index: u16) {
        let i = self.indices.len();
        self.indices.push(index);
        self.dirty |= Channels::INDEX;
        self.index_mod.mark(i);
    }

    pub(crate) fn set_normal(&mut self, i: usize, normal: Vec3) {
        self.normals[i] = normal;
        self.dirty |= Channels::NORMAL;
        self.vertex_mod.mark(i);
    }

    /// Reset counts to zero, keeping allocated storage.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.normals.clear();
        self.uvs.clear();
        self.ambient.clear();
        self.specular.clear();
        self.emissive.clear();
        self.shininess.clear();
        self.indices.clear();
        self.cache.clear();
        self.dirty = Channels::empty();
        self.vertex_mod = ModifiedRange::default();
        self.index_mod = ModifiedRange::default();
    }

    /// Shrink backing storage to the current counts.
    pub fn trim(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.normals.shrink_to_fit();
        self.uvs.shrink_to_fit();
        self.ambient.shrink_to_fit();
        self.specular.shrink_to_fit();
        self.emissive.shrink_to_fit();
        self.shininess.shrink_to_fit();
        self.indices.shrink_to_fit();
    }

    /// Report and reset the pending buffer work.
    pub fn take_sync(&mut self) -> StreamSync {
        StreamSync {
            channels: std::mem::take(&mut self.dirty),
            vertices: self.vertex_mod.take(),
            indices: self.index_mod.take(),
        }
    }
}

/// Stroked-line output stream.
///
/// The direction attribute carries the segment's opposite endpoint in xyz
/// and a signed half-weight displacement in w; a downstream shader expands
/// the quad in screen space.
#[derive(Debug, Clone, Default)]
pub struct LineStream {
    positions: Vec<Vec4>,
    colors: Vec<u32>,
    directions: Vec<Vec4>,
    indices: Vec<u16>,
    pub cache: IndexCache,
    dirty: Channels,
    vertex_mod: ModifiedRange,
    index_mod: ModifiedRange,
}

impl LineStream {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn directions(&self) -> &[Vec4] {
        &self.directions
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn direction_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directions)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub(crate) fn push_vertex(&mut self, position: Vec4, color: u32, direction: Vec4) {
        let i = self.positions.len();
        self.positions.push(position);
        self.colors.push(color);
        self.directions.push(direction);
        self.dirty |= Channels::POSITION | Channels::COLOR | Channels::DIRECTION;
        self.vertex_mod.mark(i);
    }

    pub(crate) fn push_index(&mut self, index: u16) {
        let i = self.indices.len();
        self.indices.push(index);
        self.dirty |= Channels::INDEX;
        self.index_mod.mark(i);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.directions.clear();
        self.indices.clear();
        self.cache.clear();
        self.dirty = Channels::empty();
        self.vertex_mod = ModifiedRange::default();
        self.index_mod = ModifiedRange::default();
    }

    pub fn trim(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.directions.shrink_to_fit();
        self.indices.shrink_to_fit();
    }

    pub fn take_sync(&mut self) -> StreamSync {
        StreamSync {
            channels: std::mem::take(&mut self.dirty),
            vertices: self.vertex_mod.take(),
            indices: self.index_mod.take(),
        }
    }
}

/// Point-sprite output stream.
///
/// All vertices of one point share its center position; the offset attribute
/// is the billboard displacement applied post-projection so points face the
/// camera under any transform.
#[derive(Debug, Clone, Default)]
pub struct PointStream {
    positions: Vec<Vec4>,
    colors: Vec<u32>,
    offsets: Vec<Vec2>,
    indices: Vec<u16>,
    pub cache: IndexCache,
    dirty: Channels,
    vertex_mod: ModifiedRange,
    index_mod: ModifiedRange,
}

impl PointStream {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn offset_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.offsets)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub(crate) fn push_vertex(&mut self, position: Vec4, color: u32, offset: Vec2) {
        let i = self.positions.len();
        self.positions.push(position);
        self.colors.push(color);
        self.offsets.push(offset);
        self.dirty |= Channels::POSITION | Channels::COLOR | Channels::OFFSET;
        self.vertex_mod.mark(i);
    }

    pub(crate) fn push_index(&mut self, index: u16) {
        let i = self.indices.len();
        self.indices.push(index);
        self.dirty |= Channels::INDEX;
        self.index_mod.mark(i);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.offsets.clear();
        self.indices.clear();
        self.cache.clear();
        self.dirty = Channels::empty();
        self.vertex_mod = ModifiedRange::default();
        self.index_mod = ModifiedRange::default();
    }

    pub fn trim(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.offsets.shrink_to_fit();
        self.indices.shrink_to_fit();
    }

    pub fn take_sync(&mut self) -> StreamSync {
        StreamSync {
            channels: std::mem::take(&mut self.dirty),
            vertices: self.vertex_mod.take(),
            indices: self.index_mod.take(),
        }
    }
}

/// The three tessellated output streams of one drawing surface.
#[derive(Debug, Clone, Default)]
pub struct TessGeometry {
    pub poly: PolyStream,
    pub line: LineStream,
    pub point: PointStream,
}

impl TessGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all streams, keeping allocated storage.
    pub fn clear(&mut self) {
        self.poly.clear();
        self.line.clear();
        self.point.clear();
    }

    /// Shrink all streams to their current counts.
    pub fn trim(&mut self) {
        self.poly.trim();
        self.line.trim();
        self.point.trim();
    }

    pub fn is_empty(&self) -> bool {
        self.poly.is_empty() && self.line.is_empty() && self.point.is_empty()
    }
}
