//! Easel Geometry - GPU geometry preparation for the Easel drawing API
//!
//! This crate converts a stream of user-specified path and primitive
//! vertices into GPU-ready, index-bounded triangle/line/point batches:
//! - Input accumulation with per-vertex attributes and edge derivation
//! - Winding-rule polygon tessellation with attribute interpolation at
//!   self-intersections (via Lyon)
//! - Stroke expansion with caps, joins and bevels
//! - Index-cache partitioning keeping every batch 16-bit-index safe
//! - Texture-run grouping for draw submission
//!
//! # Example
//!
//! ```
//! use easel_geometry::*;
//! use glam::Vec2;
//!
//! let mut input = InGeometry::new();
//! let mut output = TessGeometry::new();
//! let mut textures = TexCache::new();
//! let mut tessellator = Tessellator::new();
//!
//! // Append a rectangle and tessellate fill and stroke.
//! let style = VertexStyle::default().with_fill(Color::RED);
//! input.add_rect(Vec2::ZERO, Vec2::new(100.0, 50.0), &style, true);
//!
//! let params = TessParams::default();
//! tessellator.tessellate_polygon(&input, &mut output, &mut textures, &params, true);
//! tessellator.tessellate_edges(&input, &mut output, &mut textures, &params);
//!
//! // Upload output.poly / output.line and draw one batch per cache entry.
//! for entry in output.poly.cache.entries() {
//!     let _ = (entry.vertex_offset, entry.index_offset, entry.index_count);
//! }
//!
//! // Reuse the containers for the next shape.
//! input.clear();
//! output.clear();
//! textures.clear();
//! ```

// Input geometry
mod color;
mod error;
mod in_geometry;
mod style;
mod tables;

// Tessellated output
mod index_cache;
mod tess_geometry;
mod tex_cache;

// Tessellation
mod index_split;
mod line_path;
mod tessellator;

// Re-exports
pub use color::*;
pub use error::*;
pub use in_geometry::*;
pub use style::*;
pub use tables::{SINCOS_LENGTH, SinCosTable, SphereTable};

pub use index_cache::*;
pub use tess_geometry::*;
pub use tex_cache::*;

pub use index_split::*;
pub use line_path::*;
pub use tessellator::*;
