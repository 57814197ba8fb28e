//! The corner-ordered triangle value type produced and consumed by the
//! subdivision algorithms.

use glam::{Vec3, Vec4};

/// One corner-ordered triangle `(v1, v2, v3)` with per-corner shading
/// attributes.
///
/// Immutable once constructed: subdivision always produces new `Triangle`
/// values rather than mutating existing ones. Lifetime is scoped to a
/// single subdivision pass; triangles are discarded after being copied
/// into flat output buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// Corner positions.
    pub positions: [Vec3; 3],
    /// Corner normals.
    pub normals: [Vec3; 3],
    /// Corner colors (RGBA).
    pub colors: [Vec4; 3],
}

impl Triangle {
    /// Construct a triangle from explicit corner attributes.
    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3], colors: [Vec4; 3]) -> Self {
        Self {
            positions,
            normals,
            colors,
        }
    }

    /// Centroid of the three corner positions.
    pub fn centroid(&self) -> Vec3 {
        (self.positions[0] + self.positions[1] + self.positions[2]) / 3.0
    }

    /// Build the edge-midpoint triangle corner between corners `a` and `b`.
    ///
    /// All attributes are component-wise arithmetic means; subdivision
    /// happens in the mesh's local flat-triangle space, never on the
    /// sphere.
    pub fn midpoint(&self, a: usize, b: usize) -> (Vec3, Vec3, Vec4) {
        (
            (self.positions[a] + self.positions[b]) * 0.5,
            (self.normals[a] + self.normals[b]) * 0.5,
            (self.colors[a] + self.colors[b]) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 1.0, 0.0),
            ],
            [Vec3::Z; 3],
            [Vec4::ONE; 3],
        )
    }

    /// The centroid is the arithmetic mean of the three corners.
    #[test]
    fn test_centroid() {
        let tri = unit_triangle();
        let c = tri.centroid();
        assert!((c - Vec3::new(0.5, 1.0 / 3.0, 0.0)).length() < 1e-6);
    }

    /// Midpoints average position, normal, and color component-wise.
    #[test]
    fn test_midpoint_averages_all_attributes() {
        let mut tri = unit_triangle();
        tri.colors[0] = Vec4::new(1.0, 0.0, 0.0, 1.0);
        tri.colors[1] = Vec4::new(0.0, 1.0, 0.0, 1.0);

        let (pos, normal, color) = tri.midpoint(0, 1);
        assert_eq!(pos, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(normal, Vec3::Z);
        assert_eq!(color, Vec4::new(0.5, 0.5, 0.0, 1.0));
    }
}
