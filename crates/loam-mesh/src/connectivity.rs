//! Mesh connectivity — the one-time topology transmission.
//!
//! Connectivity is sent to the terrain node exactly once, at
//! initialization. Only per-vertex state is retransmitted each round,
//! so triangle indices are immutable after validation.

use loam_math::Vec3;
use loam_types::constants::DEGENERATE_AREA_THRESHOLD;
use loam_types::{LoamError, LoamResult};
use serde::{Deserialize, Serialize};

/// A surface mesh: reference vertex positions plus triangle indices.
///
/// Positions here are the reference (initial) configuration used to
/// size proxy bodies; the live per-round positions arrive through
/// [`VertexState`](crate::VertexState) updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConnectivity {
    /// Reference vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle vertex indices — each triangle is `[v1, v2, v3]`.
    pub triangles: Vec<[u32; 3]>,
}

impl MeshConnectivity {
    /// Creates and validates a mesh from positions and triangle indices.
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> LoamResult<Self> {
        let mesh = Self {
            positions,
            triangles,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the three corner positions of triangle `t`.
    #[inline]
    pub fn corners(&self, t: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Area of triangle `t`.
    pub fn triangle_area(&self, t: usize) -> f64 {
        let [a, b, c] = self.corners(t);
        0.5 * (b - a).cross(c - a).length()
    }

    /// Unit normal of triangle `t` (zero for degenerate triangles).
    pub fn triangle_normal(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.corners(t);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Centroid of triangle `t`.
    pub fn triangle_centroid(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.corners(t);
        (a + b + c) / 3.0
    }

    /// Mean edge length over all triangle edges.
    ///
    /// Used to size node proxy bodies so neighboring proxies overlap
    /// slightly and leave no contact gaps along the mesh surface.
    pub fn typical_edge_length(&self) -> f64 {
        if self.triangles.is_empty() {
            return 0.0;
        }
        let mut total = 0.0;
        for t in 0..self.triangle_count() {
            let [a, b, c] = self.corners(t);
            total += (b - a).length() + (c - b).length() + (a - c).length();
        }
        total / (3.0 * self.triangle_count() as f64)
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - Triangle indices are within the vertex range
    /// - No repeated vertex indices within a triangle
    /// - No degenerate triangles (area below the numerical threshold)
    pub fn validate(&self) -> LoamResult<()> {
        let n = self.vertex_count();

        for (t, &[a, b, c]) in self.triangles.iter().enumerate() {
            if a as usize >= n || b as usize >= n || c as usize >= n {
                return Err(LoamError::InvalidMesh(format!(
                    "triangle {} references out-of-range vertex: [{}, {}, {}] (vertex count {})",
                    t, a, b, c, n
                )));
            }
            if a == b || b == c || a == c {
                return Err(LoamError::InvalidMesh(format!(
                    "triangle {} has repeated vertex indices: [{}, {}, {}]",
                    t, a, b, c
                )));
            }
            if self.triangle_area(t) < DEGENERATE_AREA_THRESHOLD {
                return Err(LoamError::InvalidMesh(format!(
                    "triangle {} is degenerate (area below threshold)",
                    t
                )));
            }
        }

        Ok(())
    }
}
