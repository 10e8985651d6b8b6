//! Precomputed trigonometric and unit-sphere lookup tables.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;
use std::sync::LazyLock;

/// Entries in the sine/cosine table: one per half degree.
pub const SINCOS_LENGTH: usize = 720;

pub(crate) static SIN_COS: LazyLock<SinCosTable> = LazyLock::new(SinCosTable::new);

/// Full-circle sine/cosine table with half-degree precision.
///
/// Ellipse stepping, round points and round joins all sample this table at a
/// fixed angular increment instead of evaluating trigonometry per vertex.
#[derive(Debug, Clone)]
pub struct SinCosTable {
    sin: Vec<f32>,
    cos: Vec<f32>,
}

impl SinCosTable {
    fn new() -> Self {
        let mut sin = Vec::with_capacity(SINCOS_LENGTH);
        let mut cos = Vec::with_capacity(SINCOS_LENGTH);
        for i in 0..SINCOS_LENGTH {
            let theta = i as f32 * TAU / SINCOS_LENGTH as f32;
            sin.push(theta.sin());
            cos.push(theta.cos());
        }
        Self { sin, cos }
    }

    /// Unit direction at table slot `i` (wrapped).
    pub fn direction(&self, i: usize) -> Vec2 {
        let i = i % SINCOS_LENGTH;
        Vec2::new(self.cos[i], self.sin[i])
    }

    pub fn sin(&self, i: usize) -> f32 {
        self.sin[i % SINCOS_LENGTH]
    }

    pub fn cos(&self, i: usize) -> f32 {
        self.cos[i % SINCOS_LENGTH]
    }
}

/// Precomputed unit-sphere vertex grid.
///
/// `detail_v + 1` latitude rows by `detail_u + 1` longitude columns, seam
/// column duplicated. The pole rows repeat the pole position once per
/// longitude step so every pole triangle gets its own non-degenerate texture
/// coordinate.
#[derive(Debug, Clone)]
pub struct SphereTable {
    detail_u: u32,
    detail_v: u32,
    coords: Vec<Vec3>,
}

impl SphereTable {
    /// Build a unit-sphere table with the given longitude/latitude detail.
    ///
    /// Detail is clamped to a minimum of 3 steps per axis.
    pub fn new(detail_u: u32, detail_v: u32) -> Self {
        let detail_u = detail_u.max(3);
        let detail_v = detail_v.max(3);
        let cols = (detail_u + 1) as usize;
        let rows = (detail_v + 1) as usize;

        let mut coords = Vec::with_capacity(rows * cols);
        for ring in 0..rows {
            let theta = ring as f32 * std::f32::consts::PI / detail_v as f32;
            let (sin_theta, cos_theta) = (theta.sin(), theta.cos());
            for segment in 0..cols {
                let phi = segment as f32 * TAU / detail_u as f32;
                coords.push(Vec3::new(
                    sin_theta * phi.cos(),
                    cos_theta,
                    sin_theta * phi.sin(),
                ));
            }
        }

        Self {
            detail_u,
            detail_v,
            coords,
        }
    }

    pub fn detail_u(&self) -> u32 {
        self.detail_u
    }

    pub fn detail_v(&self) -> u32 {
        self.detail_v
    }

    /// Unit position at latitude row `v`, longitude column `u`.
    pub fn vertex(&self, u: u32, v: u32) -> Vec3 {
        self.coords[(v * (self.detail_u + 1) + u) as usize]
    }

    /// Texture coordinate at latitude row `v`, longitude column `u`.
    pub fn uv(&self, u: u32, v: u32) -> Vec2 {
        Vec2::new(
            u as f32 / self.detail_u as f32,
            v as f32 / self.detail_v as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sincos_quadrants() {
        let table = SinCosTable::new();
        assert!((table.cos(0) - 1.0).abs() < 1e-6);
        assert!((table.sin(SINCOS_LENGTH / 4) - 1.0).abs() < 1e-6);
        assert!((table.cos(SINCOS_LENGTH / 2) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_poles_replicated() {
        let table = SphereTable::new(8, 6);
        // Every column of the pole rows holds the same position but a
        // distinct u coordinate.
        for u in 0..=8 {
            assert!((table.vertex(u, 0) - Vec3::Y).length() < 1e-6);
            assert!((table.vertex(u, 6) + Vec3::Y).length() < 1e-6);
        }
        assert_ne!(table.uv(0, 0), table.uv(1, 0));
    }

    #[test]
    fn test_sphere_unit_radius() {
        let table = SphereTable::new(12, 9);
        for v in 0..=9 {
            for u in 0..=12 {
                assert!((table.vertex(u, v).length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_detail_clamped() {
        let table = SphereTable::new(1, 1);
        assert_eq!(table.detail_u(), 3);
        assert_eq!(table.detail_v(), 3);
    }
}
