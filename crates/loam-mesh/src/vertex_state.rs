//! Per-vertex kinematic state, retransmitted every round.

use loam_math::Vec3;
use serde::{Deserialize, Serialize};

/// Position and velocity of one mesh vertex.
///
/// Produced by the mesh-side domain every co-simulation round and
/// consumed by the proxy synchronization layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexState {
    /// World-frame position.
    pub pos: Vec3,
    /// World-frame velocity.
    pub vel: Vec3,
}

impl VertexState {
    /// A vertex at rest at the given position.
    pub fn at_rest(pos: Vec3) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
        }
    }
}
