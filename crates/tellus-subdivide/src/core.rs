//! The recursive split rule.
//!
//! Decides, per triangle per recursion level, whether to emit the triangle
//! unchanged, emit a T-junction-resolving pair, or split into four
//! children and recurse. A pure function of the per-vertex target levels;
//! no shared state, so both the batch collector and the parallel pipeline
//! drive it unchanged.

use glam::{Vec3, Vec4};
use tellus_mesh::Triangle;

use crate::params::target_level;

/// Recursively subdivide `tri`, appending emitted triangles to `out`.
///
/// `level` is the current recursion depth (0 at the root). `distances`
/// are the normalized, clamped distances of the three corners to the
/// target point; they are re-averaged alongside positions at each split
/// rather than recomputed from world distance (a deliberate approximation
/// that shapes the visual falloff — do not "fix" it).
///
/// Total over any non-NaN input. Emission order is the depth-first
/// traversal order: top, bottom-left, bottom-right, center.
pub fn subdivide(
    tri: &Triangle,
    level: u32,
    distances: [f32; 3],
    max_level: u32,
    out: &mut Vec<Triangle>,
) {
    // Terminal: leaves at the boundary level are emitted by the parent's
    // quad-split rule below, so at depth this emits nothing. The root call
    // with max_level 0 has no parent, so it degenerates to identity.
    if level == max_level {
        if max_level == 0 {
            out.push(*tri);
        }
        return;
    }

    let levels = [
        target_level(max_level, distances[0]),
        target_level(max_level, distances[1]),
        target_level(max_level, distances[2]),
    ];

    // Find the corner whose target level differs from the other two, if
    // exactly two are equal.
    let odd_corner = if levels[0] == levels[1] && levels[1] == levels[2] {
        None
    } else if levels[0] == levels[1] {
        Some(2)
    } else if levels[1] == levels[2] {
        Some(0)
    } else if levels[0] == levels[2] {
        Some(1)
    } else {
        None
    };

    if let Some(odd) = odd_corner {
        let shared = levels[(odd + 1) % 3];

        // Two vertices out of range: the triangle sits at a subdivision
        // boundary where only the far corner would want more detail. Emit
        // unchanged.
        if levels[odd] > shared && level == shared {
            out.push(*tri);
            return;
        }

        // One vertex out of range: resolve the T-junction by connecting
        // the lower-level corner to the midpoint of the opposite edge.
        // This is what keeps cracks from opening between neighbors
        // subdivided to different depths.
        if levels[odd] < shared && level == levels[odd] {
            let a = (odd + 1) % 3;
            let b = (odd + 2) % 3;
            let (mid_pos, mid_normal, mid_color) = tri.midpoint(a, b);
            out.push(Triangle::new(
                [tri.positions[odd], tri.positions[a], mid_pos],
                [tri.normals[odd], tri.normals[a], mid_normal],
                [tri.colors[odd], tri.colors[a], mid_color],
            ));
            out.push(Triangle::new(
                [tri.positions[odd], mid_pos, tri.positions[b]],
                [tri.normals[odd], mid_normal, tri.normals[b]],
                [tri.colors[odd], mid_color, tri.colors[b]],
            ));
            return;
        }
    }

    // All three corners satisfied at this depth: emit unchanged.
    if levels[0] == level && levels[1] == level && levels[2] == level {
        out.push(*tri);
        return;
    }

    // Quad split: three edge midpoints, four children, recurse.
    let (children, child_distances) = split_four(tri, distances);
    for (child, child_d) in children.iter().zip(child_distances) {
        subdivide(child, level + 1, child_d, max_level, out);
    }

    // Preserved from the reference implementation: when the next depth
    // matches all three target levels, the four children are emitted
    // verbatim in addition to whatever their own recursion produced.
    if levels == [level + 1; 3] {
        out.extend_from_slice(&children);
    }
}

/// Split a triangle into four children (top, bottom-left, bottom-right,
/// center), interpolating positions, normals, colors, and distances at
/// the three edge midpoints.
fn split_four(tri: &Triangle, distances: [f32; 3]) -> ([Triangle; 4], [[f32; 3]; 4]) {
    let (m01_pos, m01_n, m01_c) = tri.midpoint(0, 1);
    let (m12_pos, m12_n, m12_c) = tri.midpoint(1, 2);
    let (m20_pos, m20_n, m20_c) = tri.midpoint(2, 0);

    let d01 = (distances[0] + distances[1]) * 0.5;
    let d12 = (distances[1] + distances[2]) * 0.5;
    let d20 = (distances[2] + distances[0]) * 0.5;

    let corner = |i: usize| (tri.positions[i], tri.normals[i], tri.colors[i]);
    let (p0, n0, c0) = corner(0);
    let (p1, n1, c1) = corner(1);
    let (p2, n2, c2) = corner(2);

    let make = |a: (Vec3, Vec3, Vec4), b: (Vec3, Vec3, Vec4), c: (Vec3, Vec3, Vec4)| {
        Triangle::new([a.0, b.0, c.0], [a.1, b.1, c.1], [a.2, b.2, c.2])
    };

    let children = [
        // Top: v1-v3 midpoint, v3-v2 midpoint, v3.
        make((m20_pos, m20_n, m20_c), (m12_pos, m12_n, m12_c), (p2, n2, c2)),
        // Bottom-left: v1, v1-v2 midpoint, v1-v3 midpoint.
        make((p0, n0, c0), (m01_pos, m01_n, m01_c), (m20_pos, m20_n, m20_c)),
        // Bottom-right: v1-v2 midpoint, v2, v2-v3 midpoint.
        make((m01_pos, m01_n, m01_c), (p1, n1, c1), (m12_pos, m12_n, m12_c)),
        // Center: v1-v2 midpoint, v2-v3 midpoint, v3-v1 midpoint.
        make((m01_pos, m01_n, m01_c), (m12_pos, m12_n, m12_c), (m20_pos, m20_n, m20_c)),
    ];
    let child_distances = [
        [d20, d12, distances[2]],
        [distances[0], d01, d20],
        [d01, distances[1], d12],
        [d01, d12, d20],
    ];
    (children, child_distances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tellus_mesh::VertexKey;

    fn equilateral() -> Triangle {
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

    fn run(tri: &Triangle, level: u32, distances: [f32; 3], max_level: u32) -> Vec<Triangle> {
        let mut out = Vec::new();
        subdivide(tri, level, distances, max_level, &mut out);
        out
    }

    fn position_set(triangles: &[Triangle]) -> Vec<Vec3> {
        let mut seen = HashMap::new();
        for tri in triangles {
            for &pos in &tri.positions {
                seen.entry(VertexKey::new(pos)).or_insert(pos);
            }
        }
        seen.into_values().collect()
    }

    /// max_level 0 degenerates to returning the input unchanged.
    #[test]
    fn test_max_level_zero_identity() {
        let tri = equilateral();
        let out = run(&tri, 0, [0.0; 3], 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], tri);
    }

    /// A fully in-range triangle at max_level 1 yields exactly the four
    /// children: top, bottom-left, bottom-right, center.
    #[test]
    fn test_single_level_split_yields_four_children() {
        let tri = equilateral();
        let out = run(&tri, 0, [0.0; 3], 1);
        assert_eq!(out.len(), 4);

        let positions = position_set(&out);
        assert_eq!(positions.len(), 6);
        for expected in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.75, 0.5, 0.0),
            Vec3::new(0.25, 0.5, 0.0),
        ] {
            assert!(
                positions.contains(&expected),
                "missing vertex {expected:?} in {positions:?}"
            );
        }
    }

    /// Two corners at the shared lower level and one far corner wanting
    /// more detail: emit unchanged (subdivision boundary short-circuit).
    /// Target levels here are (2, 2, 5) evaluated at level 2.
    #[test]
    fn test_two_out_of_range_emits_unchanged() {
        let tri = equilateral();
        // max_level 5: d = 0.5 -> floor(2.5) = 2, d = 0.0 -> 5.
        let out = run(&tri, 2, [0.5, 0.5, 0.0], 5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], tri);
    }

    /// One corner at a lower target level than the other two: the
    /// T-junction is resolved by connecting it to the opposite edge's
    /// midpoint, yielding exactly two triangles.
    #[test]
    fn test_one_out_of_range_resolves_t_junction() {
        let tri = equilateral();
        // max_level 1: d = 0 -> level 1 for v1/v2, d = 1 -> level 0 for v3.
        let out = run(&tri, 0, [0.0, 0.0, 1.0], 1);
        assert_eq!(out.len(), 2);

        let mid = Vec3::new(0.5, 0.0, 0.0); // midpoint of the v1-v2 edge
        for emitted in &out {
            assert!(emitted.positions.contains(&mid));
            assert!(emitted.positions.contains(&Vec3::new(0.5, 1.0, 0.0)));
        }
        // Winding: low corner first in both halves.
        assert_eq!(out[0].positions[0], Vec3::new(0.5, 1.0, 0.0));
        assert_eq!(out[1].positions[0], Vec3::new(0.5, 1.0, 0.0));
    }

    /// An entirely out-of-range triangle is emitted as-is at the root.
    #[test]
    fn test_out_of_range_triangle_unchanged() {
        let tri = equilateral();
        let out = run(&tri, 0, [1.0; 3], 3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], tri);
    }

    /// Uniform full-range subdivision to depth 2 yields 16 triangles and
    /// the expected 15-vertex grid.
    #[test]
    fn test_two_level_uniform_split() {
        let tri = equilateral();
        let out = run(&tri, 0, [0.0; 3], 2);
        assert_eq!(out.len(), 16);
        assert_eq!(position_set(&out).len(), 15);
    }

    /// The same input produces bit-exact identical output on repeat runs.
    #[test]
    fn test_determinism() {
        let tri = equilateral();
        let a = run(&tri, 0, [0.0, 0.3, 0.7], 4);
        let b = run(&tri, 0, [0.0, 0.3, 0.7], 4);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x, y);
        }
    }

    /// Two source triangles sharing an edge, subdivided to different
    /// depths, must agree on the multiset of boundary-edge endpoints
    /// (no T-junction along the shared edge).
    #[test]
    fn test_no_crack_across_shared_edge() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let near = Triangle::new(
            [a, b, Vec3::new(0.5, 1.0, 0.0)],
            [Vec3::Z; 3],
            [Vec4::ONE; 3],
        );
        let far = Triangle::new(
            [b, a, Vec3::new(0.5, -1.0, 0.0)],
            [Vec3::Z; 3],
            [Vec4::ONE; 3],
        );

        // Shared-edge corners are fully in range on both sides; the far
        // triangle's apex is out of range, so it resolves a T-junction
        // while the near one splits fully.
        let near_out = run(&near, 0, [0.0, 0.0, 0.0], 1);
        let far_out = run(&far, 0, [0.0, 0.0, 1.0], 1);

        let boundary_vertices = |triangles: &[Triangle]| {
            let mut on_edge: Vec<VertexKey> = triangles
                .iter()
                .flat_map(|t| t.positions)
                .filter(|p| p.y == 0.0)
                .map(VertexKey::new)
                .collect();
            on_edge.sort();
            on_edge.dedup();
            on_edge
        };

        assert_eq!(boundary_vertices(&near_out), boundary_vertices(&far_out));
    }

    /// Flag property from the reference implementation: emitting the four
    /// children verbatim on top of their own recursion can double-emit
    /// triangles at the exact boundary level. A failure here confirms the
    /// inherited double emission rather than a bug in this port.
    #[test]
    #[ignore]
    fn test_no_duplicate_triangles_at_boundary_level() {
        let tri = equilateral();
        // d = 0.5 at max_level 2 targets level 1 everywhere: the split at
        // level 0 both recurses (children emit themselves) and re-emits
        // the children.
        let out = run(&tri, 0, [0.5; 3], 2);

        let mut keys: Vec<[VertexKey; 3]> = out
            .iter()
            .map(|t| t.positions.map(VertexKey::new))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len(), "duplicate triangles in output");
    }
}
