//! Mesh validation error types.

/// Errors raised when a source mesh violates the indexed-triangle contract.
///
/// These are programming-contract violations from the mesh-loading layer,
/// not runtime conditions to recover from; callers are expected to fail
/// fast on them.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// An index refers past the end of the vertex arrays.
    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        /// The offending index value.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The normal or color array does not match the position array length.
    #[error("attribute length mismatch: {positions} positions, {normals} normals, {colors} colors")]
    AttributeLengthMismatch {
        /// Position count.
        positions: usize,
        /// Normal count.
        normals: usize,
        /// Color count.
        colors: usize,
    },

    /// The index buffer length is not a multiple of three.
    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotTriangular(usize),
}
