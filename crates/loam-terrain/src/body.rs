//! Terrain bodies.
//!
//! Every body is backed by exactly one 6-dof state block in the
//! domain's arena: [vx, vy, vz, wx, wy, wz]. The inverse-inertia
//! diagonal is a world-aligned approximation, which is exact for
//! spheres and adequate for the thin proxy plates this domain hosts.

use loam_math::{Quat, Vec3};
use loam_types::BlockId;
use serde::{Deserialize, Serialize};

/// Collision shape of a terrain body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Shape {
    /// Sphere with the given radius.
    Sphere { radius: f64 },
    /// Axis-aligned box with the given half extents. Boxes are fixed
    /// terrain obstacles; they never move, only spheres collide with
    /// them.
    Box { half_extents: Vec3 },
    /// Half-space: points with `x·normal <= offset` are inside.
    Plane { normal: Vec3, offset: f64 },
}

/// World-frame pose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    pub pos: Vec3,
    pub rot: Quat,
}

impl Pose {
    pub fn at(pos: Vec3) -> Self {
        Self {
            pos,
            rot: Quat::IDENTITY,
        }
    }
}

/// Contact filtering group.
///
/// Proxy bodies stand in for one shared mesh surface and must not
/// collide with one another (neighboring proxies overlap by design of
/// their sizing), only with terrain content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyGroup {
    /// Terrain content: ground plane, granular particles.
    Terrain,
    /// A proxy standing in for a mesh vertex or triangle.
    Proxy,
}

/// A rigid body owned by the terrain domain.
#[derive(Debug, Clone)]
pub struct TerrainBody {
    pub shape: Shape,
    pub pose: Pose,
    pub mass: f64,
    pub group: BodyGroup,
    pub fixed: bool,
    /// The body's 6-dof velocity/impulse block in the domain arena.
    pub block: BlockId,
}

impl TerrainBody {
    /// Diagonal inverse-mass terms for the body's state block.
    ///
    /// `inertia` is the world-aligned diagonal inertia; fixed bodies
    /// get all-zero terms.
    pub fn block_inv_mass(mass: f64, inertia: Vec3, fixed: bool) -> Vec<f64> {
        if fixed || mass <= 0.0 {
            return vec![0.0; 6];
        }
        let im = 1.0 / mass;
        let inv = |x: f64| if x > 0.0 { 1.0 / x } else { 0.0 };
        vec![im, im, im, inv(inertia.x), inv(inertia.y), inv(inertia.z)]
    }

    /// Solid-sphere inertia diagonal: 2/5·m·r² about every axis.
    pub fn sphere_inertia(mass: f64, radius: f64) -> Vec3 {
        Vec3::splat(0.4 * mass * radius * radius)
    }
}
