//! Frustum pre-filter for the subdivide stage.
//!
//! A cheap performance short-circuit, not a correctness requirement:
//! triangles judged outside the view are passed through to the output
//! unchanged instead of being subdivided.

use glam::{Mat4, Vec3, Vec4};
use tellus_config::CullingConfig;

/// Six culling planes, stored as `Vec4(nx, ny, nz, d)` with normals
/// pointing inward.
///
/// Extracted from a view-projection matrix with the Gribb/Hartmann
/// method, or supplied directly by the host engine.
#[derive(Clone, Debug)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    pub fn from_view_proj(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0, // left
            row3 - row0, // right
            row3 + row1, // bottom
            row3 - row1, // top
            row3 + row2, // GL-style near (no-op under 0..1 clip depth)
            // Clip z >= 0. Under glam's 0..1 depth convention this is the
            // actual near plane, so the set carries no far plane and
            // triangles between the camera and the near plane fail it;
            // the `near_override` check in `triangle_outside` is what
            // keeps those unculled.
            row2,
        ];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 1e-8 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Build from host-supplied planes (normal + distance per plane).
    pub fn from_planes(planes: [Vec4; 6]) -> Self {
        Self { planes }
    }

    /// Returns `true` if the triangle is considered outside the view.
    ///
    /// Outside means the world-space centroid is farther from `camera`
    /// than `near_override` (nearby triangles are never culled, however
    /// the planes fall) and some plane has all three world-space vertices
    /// on its negative side.
    pub fn triangle_outside(
        &self,
        world: &Mat4,
        positions: &[Vec3; 3],
        camera: Vec3,
        near_override: f32,
    ) -> bool {
        let world_positions = positions.map(|p| world.transform_point3(p));
        let centroid = (world_positions[0] + world_positions[1] + world_positions[2]) / 3.0;
        if centroid.distance(camera) <= near_override {
            return false;
        }

        'planes: for plane in &self.planes {
            let normal = plane.truncate();
            let distance = plane.w;
            for position in world_positions {
                if normal.dot(position) + distance >= 0.0 {
                    continue 'planes;
                }
            }
            // Every vertex behind this plane: the triangle cannot touch
            // the view volume.
            return true;
        }
        false
    }
}

/// Everything the subdivide stage needs to run the pre-filter.
#[derive(Clone, Debug)]
pub struct CullingParams {
    /// The view frustum.
    pub frustum: Frustum,
    /// Mesh-local to world transform.
    pub world: Mat4,
    /// Camera position in world space.
    pub camera: Vec3,
    /// Triangles whose centroid is within this distance of the camera
    /// are never culled.
    pub near_override: f32,
}

impl CullingParams {
    /// Build the pre-filter from loaded settings and the host's view
    /// state. Returns `None` when culling is disabled in the settings.
    pub fn from_config(
        config: &CullingConfig,
        frustum: Frustum,
        world: Mat4,
        camera: Vec3,
    ) -> Option<Self> {
        config.enabled.then(|| Self {
            frustum,
            world,
            camera,
            near_override: config.near_override,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_neg_z() -> Frustum {
        Frustum::from_view_proj(
            &(Mat4::perspective_rh(1.0, 1.0, 0.1, 10_000.0)
                * Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y)),
        )
    }

    fn triangle_at(center: Vec3) -> [Vec3; 3] {
        [
            center + Vec3::new(-1.0, -1.0, 0.0),
            center + Vec3::new(1.0, -1.0, 0.0),
            center + Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    /// A triangle directly ahead is never culled.
    #[test]
    fn test_triangle_ahead_is_kept() {
        let frustum = looking_down_neg_z();
        let positions = triangle_at(Vec3::new(0.0, 0.0, -100.0));
        assert!(!frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 0.0));
    }

    /// A triangle behind the camera is culled.
    #[test]
    fn test_triangle_behind_camera_is_culled() {
        let frustum = looking_down_neg_z();
        let positions = triangle_at(Vec3::new(0.0, 0.0, 100.0));
        assert!(frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 0.0));
    }

    /// The near override keeps close-by triangles regardless of planes.
    #[test]
    fn test_near_override_keeps_close_triangles() {
        let frustum = looking_down_neg_z();
        let positions = triangle_at(Vec3::new(0.0, 0.0, 5.0)); // behind camera
        assert!(frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 1.0));
        assert!(!frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 10.0));
    }

    /// The world transform is applied before the plane tests.
    #[test]
    fn test_world_transform_applies() {
        let frustum = looking_down_neg_z();
        // Local-space triangle behind the camera, moved ahead by the
        // world transform.
        let positions = triangle_at(Vec3::new(0.0, 0.0, 100.0));
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, -200.0));
        assert!(!frustum.triangle_outside(&world, &positions, Vec3::ZERO, 0.0));
    }

    /// Without a near override, geometry between the camera and the near
    /// plane is rejected by the clip z >= 0 plane; the override is what
    /// keeps it.
    #[test]
    fn test_between_camera_and_near_plane_relies_on_override() {
        let frustum = looking_down_neg_z();
        // Closer to the camera than the near distance of 0.1.
        let positions = [
            Vec3::new(0.0, 0.0, -0.05),
            Vec3::new(0.01, 0.0, -0.05),
            Vec3::new(0.0, 0.01, -0.05),
        ];
        assert!(frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 0.0));
        assert!(!frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 1.0));
    }

    /// Settings bridge: disabled culling yields no params, enabled ones
    /// carry the configured near override.
    #[test]
    fn test_culling_params_from_config() {
        let mut config = CullingConfig::default();
        config.near_override = 2.5;

        let params =
            CullingParams::from_config(&config, looking_down_neg_z(), Mat4::IDENTITY, Vec3::ZERO)
                .unwrap();
        assert_eq!(params.near_override, 2.5);

        config.enabled = false;
        assert!(
            CullingParams::from_config(&config, looking_down_neg_z(), Mat4::IDENTITY, Vec3::ZERO)
                .is_none()
        );
    }

    /// A triangle straddling a plane boundary (one vertex inside) is kept.
    #[test]
    fn test_straddling_triangle_is_kept() {
        let frustum = looking_down_neg_z();
        let positions = [
            Vec3::new(0.0, 0.0, -50.0),   // inside
            Vec3::new(500.0, 0.0, -50.0), // far right, outside
            Vec3::new(500.0, 10.0, -50.0),
        ];
        assert!(!frustum.triangle_outside(&Mat4::IDENTITY, &positions, Vec3::ZERO, 0.0));
    }
}
