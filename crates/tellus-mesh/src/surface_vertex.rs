//! Interleaved vertex format for GPU upload.

use glam::{Vec3, Vec4};

/// A single terrain surface vertex, interleaved for direct upload.
///
/// Layout (40 bytes total):
///   - `[0..12]`  position `[f32; 3]`
///   - `[12..24]` normal `[f32; 3]`
///   - `[24..40]` color `[f32; 4]` (RGBA)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SurfaceVertex {
    /// Position in mesh-local coordinates.
    pub position: [f32; 3],
    /// Vertex normal.
    pub normal: [f32; 3],
    /// Vertex color (RGBA).
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(SurfaceVertex, [u8; 40]);

impl SurfaceVertex {
    /// Construct from glam attribute values.
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color: color.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The packed layout round-trips through a raw byte view.
    #[test]
    fn test_pod_byte_view() {
        let vertex = SurfaceVertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::Z,
            Vec4::new(0.25, 0.5, 0.75, 1.0),
        );
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 40);
        let back: &SurfaceVertex = bytemuck::from_bytes(bytes);
        assert_eq!(*back, vertex);
    }
}
