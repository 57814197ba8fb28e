//! Bit-exact position keys for vertex deduplication.

use glam::Vec3;
use rustc_hash::FxHashMap;

/// A hashable, bit-exact key for a vertex position.
///
/// Built from the raw `f32` bit patterns of the three components, so two
/// positions dedup to the same vertex only when they are bit-identical.
/// Midpoint arithmetic during subdivision is deterministic, so shared
/// edges produce identical bits on both sides of a boundary. Note that
/// `-0.0` and `0.0` are distinct keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey([u32; 3]);

impl VertexKey {
    /// Key a position by its exact bit pattern.
    ///
    /// Positions are assumed non-NaN per the input contract; NaN keys
    /// would never dedup against each other anyway (distinct payloads).
    pub fn new(position: Vec3) -> Self {
        Self([
            position.x.to_bits(),
            position.y.to_bits(),
            position.z.to_bits(),
        ])
    }
}

impl From<Vec3> for VertexKey {
    fn from(position: Vec3) -> Self {
        Self::new(position)
    }
}

/// The deduplicated position → dense output index table.
///
/// Built once per subdivision pass over the complete set of emitted
/// triangles. An index is stable only after the full table is populated;
/// no lookups are permitted while the build phase over a stream is still
/// running.
pub type VertexTable = FxHashMap<VertexKey, u32>;
