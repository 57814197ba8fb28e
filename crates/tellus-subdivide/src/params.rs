//! Distance falloff parameters: how far a vertex is from the target point
//! decides how deep it wants to be subdivided.

use glam::Vec3;

/// Configuration for a subdivision pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubdivisionParams {
    /// Maximum subdivision depth. Practically 1..=7; 0 degenerates to an
    /// identity pass.
    pub max_level: u32,
    /// World-space distance at which detail falls to zero. Must be
    /// positive.
    pub range: f32,
}

impl SubdivisionParams {
    /// Create parameters, clamping a non-positive range up to a small
    /// epsilon so the falloff stays well-defined.
    pub fn new(max_level: u32, range: f32) -> Self {
        Self {
            max_level,
            range: range.max(f32::EPSILON),
        }
    }

    /// Normalized, clamped distance from `position` to `target`:
    /// 0 = at the target, 1 = at or beyond the subdivision range.
    pub fn normalized_distance(&self, position: Vec3, target: Vec3) -> f32 {
        (position.distance(target) / self.range).clamp(0.0, 1.0)
    }
}

impl Default for SubdivisionParams {
    fn default() -> Self {
        Self::new(5, 64.0)
    }
}

/// The subdivision depth a vertex "wants" at normalized distance `d`:
/// linear interpolation from `max_level` at the target down to 0 at the
/// range boundary, truncated to an integer.
pub fn target_level(max_level: u32, d: f32) -> u32 {
    (max_level as f32 * (1.0 - d)).floor() as u32
}
