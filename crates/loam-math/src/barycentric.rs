//! Barycentric coordinates on a triangle.
//!
//! Used to redistribute a force acting at a contact point on a mesh
//! triangle into weighted contributions at its three vertices.

use crate::Vec3;

/// Barycentric coordinates of point `p` with respect to triangle `(a, b, c)`.
///
/// Returns `(u, v, w)` with `u + v + w = 1` such that
/// `p = u·a + v·b + w·c` for points in the triangle's plane. The point is
/// projected onto the plane first, so off-plane contact points are handled.
/// Degenerate triangles fall back to centroid weights `(1/3, 1/3, 1/3)`,
/// which keeps the redistributed force sum exact.
pub fn barycentric_coords(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    // Cramer's rule on the plane basis (ab, ac).
    let d00 = ab.dot(ab);
    let d01 = ab.dot(ac);
    let d11 = ac.dot(ac);
    let d20 = ap.dot(ab);
    let d21 = ap.dot(ac);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1.0e-20 {
        return Vec3::splat(1.0 / 3.0);
    }
    let inv_denom = 1.0 / denom;

    let v = (d11 * d20 - d01 * d21) * inv_denom;
    let w = (d00 * d21 - d01 * d20) * inv_denom;
    let u = 1.0 - v - w;

    Vec3::new(u, v, w)
}
