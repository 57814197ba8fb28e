//! Single-threaded driver: subdivides every source triangle, then
//! deduplicates shared vertices into compact output buffers.

use glam::Vec3;

use tellus_mesh::{MeshBuffers, MeshError, Triangle, VertexKey, VertexTable};

use crate::core::subdivide;
use crate::params::SubdivisionParams;

/// Subdivide `source` toward `target` and rebuild flat, deduplicated
/// output buffers.
///
/// Every source triangle is subdivided at level 0 into one ordered working
/// list, then vertices are deduplicated in two passes: the first assigns
/// dense indices in insertion order, the second (with the final vertex
/// count known) scatters attributes and resolves index triples. Re-writing
/// an already-populated slot is idempotent — duplicates carry identical
/// attributes by construction.
///
/// An empty source yields empty output. Malformed index buffers fail fast
/// with [`MeshError`].
pub fn collect_subdivided(
    source: &MeshBuffers,
    target: Vec3,
    params: &SubdivisionParams,
) -> Result<MeshBuffers, MeshError> {
    source.validate()?;

    let mut emitted: Vec<Triangle> = Vec::new();
    for i in 0..source.triangle_count() {
        let tri = source.extract_triangle(i)?;
        let distances = [
            params.normalized_distance(tri.positions[0], target),
            params.normalized_distance(tri.positions[1], target),
            params.normalized_distance(tri.positions[2], target),
        ];
        subdivide(&tri, 0, distances, params.max_level, &mut emitted);
    }

    // Pass 1: assign a dense index to every distinct position. The exact
    // vertex count must be known before the output arrays are allocated.
    let mut table = VertexTable::default();
    for tri in &emitted {
        for &position in &tri.positions {
            let next = table.len() as u32;
            table.entry(VertexKey::new(position)).or_insert(next);
        }
    }

    let vertex_count = table.len();
    let mut output = MeshBuffers {
        positions: vec![Vec3::ZERO; vertex_count],
        normals: vec![Vec3::ZERO; vertex_count],
        colors: vec![glam::Vec4::ZERO; vertex_count],
        indices: Vec::with_capacity(emitted.len() * 3),
    };

    // Pass 2: scatter attributes into their assigned slots and resolve
    // the index buffer.
    for tri in &emitted {
        for corner in 0..3 {
            let index = table[&VertexKey::new(tri.positions[corner])];
            let slot = index as usize;
            output.positions[slot] = tri.positions[corner];
            output.normals[slot] = tri.normals[corner];
            output.colors[slot] = tri.colors[corner];
            output.indices.push(index);
        }
    }

    log::debug!(
        "subdivided {} -> {} triangles, {} vertices",
        source.triangle_count(),
        emitted.len(),
        vertex_count
    );

    Ok(output)
}
