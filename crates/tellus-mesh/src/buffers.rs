//! Flat indexed-triangle mesh buffers exchanged with the host engine.

use glam::{Vec3, Vec4};

use crate::error::MeshError;
use crate::surface_vertex::SurfaceVertex;
use crate::triangle::Triangle;

/// A flat indexed triangle mesh: positions, normals, colors, and a
/// triangle index buffer sharing one index space.
///
/// This is both the input handed in by the host engine and the rebuilt
/// output produced by a subdivision pass, suitable for direct upload as a
/// replacement mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals, same length as `positions`.
    pub normals: Vec<Vec3>,
    /// Vertex colors (RGBA), same length as `positions`.
    pub colors: Vec<Vec4>,
    /// Triangle indices, 3 per triangle.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles described by the index buffer.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Check the indexed-triangle contract: matching attribute lengths, a
    /// triangular index count, and every index in range.
    ///
    /// Empty buffers are a valid trivial mesh, not an error.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.normals.len() != self.positions.len() || self.colors.len() != self.positions.len()
        {
            return Err(MeshError::AttributeLengthMismatch {
                positions: self.positions.len(),
                normals: self.normals.len(),
                colors: self.colors.len(),
            });
        }
        if !self.indices.len().is_multiple_of(3) {
            return Err(MeshError::IndexCountNotTriangular(self.indices.len()));
        }
        let vertex_count = self.positions.len();
        for &index in &self.indices {
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfBounds {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Extract triangle `i` (by triangle index, not index-buffer offset)
    /// with its corner attributes.
    pub fn extract_triangle(&self, i: usize) -> Result<Triangle, MeshError> {
        let base = i * 3;
        let mut positions = [Vec3::ZERO; 3];
        let mut normals = [Vec3::ZERO; 3];
        let mut colors = [Vec4::ZERO; 3];
        for corner in 0..3 {
            let index = self.indices[base + corner];
            let slot = index as usize;
            if slot >= self.positions.len() {
                return Err(MeshError::IndexOutOfBounds {
                    index,
                    vertex_count: self.positions.len(),
                });
            }
            positions[corner] = self.positions[slot];
            normals[corner] = self.normals[slot];
            colors[corner] = self.colors[slot];
        }
        Ok(Triangle::new(positions, normals, colors))
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, color: Vec4) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.colors.push(color);
        index
    }

    /// Interleave the attribute arrays into packed [`SurfaceVertex`]s for
    /// GPU upload.
    pub fn interleave(&self) -> Vec<SurfaceVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.colors)
            .map(|((&position, &normal), &color)| SurfaceVertex::new(position, normal, color))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangle_strip() -> MeshBuffers {
        // Two triangles sharing the edge (1, 2).
        MeshBuffers {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            colors: vec![Vec4::ONE; 4],
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    /// Empty buffers validate and report zero triangles.
    #[test]
    fn test_empty_mesh_is_valid() {
        let mesh = MeshBuffers::new();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.is_empty());
    }

    /// A well-formed mesh validates and extracts triangles correctly.
    #[test]
    fn test_extract_triangle() {
        let mesh = two_triangle_strip();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 2);

        let tri = mesh.extract_triangle(1).unwrap();
        assert_eq!(tri.positions[0], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(tri.positions[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(tri.positions[2], Vec3::new(1.0, 1.0, 0.0));
    }

    /// Out-of-range indices fail fast instead of corrupting output.
    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut mesh = two_triangle_strip();
        mesh.indices[4] = 99;
        match mesh.validate() {
            Err(MeshError::IndexOutOfBounds {
                index,
                vertex_count,
            }) => {
                assert_eq!(index, 99);
                assert_eq!(vertex_count, 4);
            }
            other => panic!("expected IndexOutOfBounds, got {other:?}"),
        }
        assert!(mesh.extract_triangle(1).is_err());
    }

    /// Mismatched attribute lengths are rejected.
    #[test]
    fn test_attribute_length_mismatch_is_rejected() {
        let mut mesh = two_triangle_strip();
        mesh.normals.pop();
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::AttributeLengthMismatch { .. })
        ));
    }

    /// A non-triangular index count is rejected.
    #[test]
    fn test_non_triangular_index_count_is_rejected() {
        let mut mesh = two_triangle_strip();
        mesh.indices.pop();
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexCountNotTriangular(5))
        ));
    }

    /// Interleaving preserves per-vertex attributes in order.
    #[test]
    fn test_interleave_matches_source_order() {
        let mesh = two_triangle_strip();
        let vertices = mesh.interleave();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].position, [1.0, 1.0, 0.0]);
        assert_eq!(vertices[3].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[3].color, [1.0, 1.0, 1.0, 1.0]);
    }
}
