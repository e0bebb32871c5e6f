//! Procedural mesh generators for tests and benchmarks.
//!
//! Deterministic, resolution-configurable meshes with consistent
//! winding order. The frame is Z-up, matching the terrain domain.

use loam_math::Vec3;

use crate::connectivity::MeshConnectivity;

/// Generates a flat rectangular grid in the XY plane at height `z`.
///
/// The grid spans `[-width/2, width/2]` in X and `[-depth/2, depth/2]`
/// in Y, centered at the origin.
///
/// # Arguments
/// - `cols` — Number of quads along X (vertex count = cols + 1).
/// - `rows` — Number of quads along Y (vertex count = rows + 1).
/// - `width` — Total extent along X in meters.
/// - `depth` — Total extent along Y in meters.
/// - `z` — Height of the grid plane.
///
/// # Example
/// ```
/// use loam_mesh::generators::flat_grid;
/// let mesh = flat_grid(1, 1, 1.0, 1.0, 0.1);
/// assert_eq!(mesh.vertex_count(), 4);
/// assert_eq!(mesh.triangle_count(), 2);
/// ```
pub fn flat_grid(cols: usize, rows: usize, width: f64, depth: f64, z: f64) -> MeshConnectivity {
    let verts_x = cols + 1;
    let verts_y = rows + 1;

    let mut positions = Vec::with_capacity(verts_x * verts_y);
    let mut triangles = Vec::with_capacity(cols * rows * 2);

    let half_w = width / 2.0;
    let half_d = depth / 2.0;

    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as f64 / cols as f64;
            let v = j as f64 / rows as f64;
            positions.push(Vec3::new(-half_w + u * width, -half_d + v * depth, z));
        }
    }

    // Two triangles per quad, counter-clockwise seen from +Z.
    for j in 0..rows {
        for i in 0..cols {
            let near_left = (j * verts_x + i) as u32;
            let near_right = near_left + 1;
            let far_left = near_left + verts_x as u32;
            let far_right = far_left + 1;

            triangles.push([near_left, near_right, far_left]);
            triangles.push([near_right, far_right, far_left]);
        }
    }

    MeshConnectivity {
        positions,
        triangles,
    }
}
